//! End-to-end conversion of TMX fixtures

use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::CorpusError;
use crate::output::{BufferOutput, FileOutput};
use crate::tokenizer::TagMode;

const HELLO_TMX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tmx version="1.4">
  <header srclang="ja" datatype="plaintext" segtype="sentence" adminlang="en"/>
  <body>
    <tu>
      <tuv xml:lang="ja-JP"><seg>こんにちは、世界！</seg></tuv>
      <tuv xml:lang="EN-us"><seg>Hello, world!</seg></tuv>
    </tu>
  </body>
</tmx>
"#;

const MIXED_TMX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tmx version="1.4">
  <body>
    <tu>
      <tuv xml:lang="en"><seg>Press <bpt i="1">&lt;b&gt;</bpt>Save<ept i="1">&lt;/b&gt;</ept> now</seg></tuv>
      <tuv xml:lang="fr"><seg>Appuyez sur <bpt i="1">&lt;b&gt;</bpt>Enregistrer<ept i="1">&lt;/b&gt;</ept></seg></tuv>
    </tu>
    <tu>
      <tuv xml:lang="en"><seg>   </seg></tuv>
      <tuv xml:lang="fr"><seg>vide</seg></tuv>
    </tu>
    <tu>
      <tuv xml:lang="en"><seg>first</seg></tuv>
      <tuv xml:lang="en"><seg>second</seg></tuv>
      <tuv xml:lang="fr"><seg>deuxième</seg></tuv>
    </tu>
    <tu>
      <tuv xml:lang="en"><seg>visit http://example.com for info</seg></tuv>
      <tuv xml:lang="de"><seg>siehe http://example.com</seg></tuv>
    </tu>
  </body>
</tmx>
"#;

fn write_fixture(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_hello_world_to_buffer() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "hello.tmx", HELLO_TMX);

    let mut output = BufferOutput::new();
    let summary = crate::convert(&[dir.path()], &Config::default(), &mut output).unwrap();
    assert_eq!(summary.documents, 1);
    assert_eq!(summary.emitted, 1);
    assert_eq!(summary.suppressed, 0);

    assert_eq!(output.lines("ja"), ["こんにちは、世界！"]);
    assert_eq!(output.lines("en"), ["Hello, world!"]);
    assert_eq!(output.lines("tok.en"), ["Hello ,  world !"]);

    #[cfg(feature = "japanese")]
    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        serde_json::json!({
            "ja": ["こんにちは、世界！"],
            "en": ["Hello, world!"],
            "tok.ja": ["こんにちは 、 世界 ！"],
            "tok.en": ["Hello ,  world !"],
        })
    );
}

#[test]
fn test_file_output_end_to_end() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(input.path(), "a/hello.tmx", HELLO_TMX);
    write_fixture(input.path(), "b/mixed.tmx", MIXED_TMX);
    write_fixture(input.path(), "b/notes.txt", "not a memory");

    let config = Config {
        output_dir: out.path().to_path_buf(),
        ..Config::default()
    };
    let mut output = FileOutput::new(&config.output_dir).with_prefix(&config.file_prefix);
    let summary = crate::convert(&[input.path()], &config, &mut output).unwrap();
    drop(output);

    assert_eq!(summary.documents, 2);
    assert_eq!(summary.emitted, 4);
    assert_eq!(summary.suppressed, 1);
    assert!(summary.failed_documents.is_empty());

    let read = |stream: &str| fs::read_to_string(out.path().join(format!("bitext.{}", stream))).unwrap();
    assert_eq!(read("ja"), "こんにちは、世界！\n");
    assert_eq!(
        read("en"),
        "Hello, world!\nPress <b>Save</b> now\nsecond\nvisit http://example.com for info\n"
    );
    assert_eq!(read("fr"), "Appuyez sur <b>Enregistrer</b>\ndeuxième\n");
    assert_eq!(read("de"), "siehe http://example.com\n");
    assert_eq!(read("tok.de"), "siehe http://example.com\n");

    let tokenized = read("tok.en");
    let lines: Vec<&str> = tokenized.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Hello ,  world !");
    assert!(lines.iter().all(|line| !line.contains('<') && !line.contains('>')));
    assert!(lines[3].split(' ').any(|token| token == "http://example.com"));
}

#[test]
fn test_glom_mode_keeps_tags_as_tokens() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "mixed.tmx", MIXED_TMX);

    let config = Config {
        tag_mode: TagMode::Glom,
        ..Config::default()
    };
    let mut output = BufferOutput::new();
    crate::convert(&[dir.path()], &config, &mut output).unwrap();
    let first = &output.lines("tok.en")[0];
    assert!(first.split(' ').any(|token| token == "<b>"));
    assert!(first.split(' ').any(|token| token == "</b>"));
}

#[test]
fn test_language_and_length_filters() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "mixed.tmx", MIXED_TMX);

    let config = Config::from_json(r#"{"languages": ["en", "fr"], "max_tokens": 2}"#).unwrap();
    let mut output = BufferOutput::new();
    let summary = crate::convert(&[dir.path()], &config, &mut output).unwrap();

    assert_eq!(output.lines("en"), ["second"]);
    assert!(output.lines("de").is_empty());
    assert_eq!(summary.emitted, 1);
    assert_eq!(summary.filtered, 2);
    assert_eq!(summary.suppressed, 3);
}

#[test]
fn test_no_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "notes.txt", "nothing here");

    let mut output = BufferOutput::new();
    let result = crate::convert(&[dir.path()], &Config::default(), &mut output);
    assert!(matches!(result, Err(CorpusError::NoInput)));
}

#[test]
fn test_malformed_document_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "a_broken.tmx", "<tmx><body><tu><tuv xml:lang=\"en\">");
    write_fixture(dir.path(), "b_hello.tmx", HELLO_TMX);

    let mut output = BufferOutput::new();
    let summary = crate::convert(&[dir.path()], &Config::default(), &mut output).unwrap();

    assert_eq!(summary.documents, 2);
    assert_eq!(summary.emitted, 1);
    assert_eq!(summary.failed_documents.len(), 1);
    assert!(summary.failed_documents[0].ends_with("a_broken.tmx"));
    assert_eq!(output.lines("en"), ["Hello, world!"]);
}

#[test]
fn test_summary_serializes_rejection_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "mixed.tmx", MIXED_TMX);

    let mut output = BufferOutput::new();
    let summary = crate::convert(&[dir.path()], &Config::default(), &mut output).unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["emitted"], 3);
    assert_eq!(json["extraction"]["units"], 4);
    assert_eq!(json["extraction"]["rejections"]["blank_segment"], 1);
    assert_eq!(json["extraction"]["rejections"]["arity"], 1);
}

#[test]
fn test_utf16_document_with_escaped_line_break() {
    let dir = tempfile::tempdir().unwrap();
    let xml = r#"<?xml version="1.0" encoding="UTF-16"?>
<tmx version="1.4"><body>
  <tu>
    <tuv xml:lang="en"><seg>Line one&lt;br/&gt;Line two</seg></tuv>
    <tuv xml:lang="de"><seg>Zeile eins&lt;br/&gt;Zeile zwei</seg></tuv>
  </tu>
</body></tmx>"#;
    let mut bytes = vec![0xFF, 0xFE];
    for unit in xml.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(dir.path().join("utf16.tmx"), bytes).unwrap();

    let mut output = BufferOutput::new();
    let summary = crate::convert(&[dir.path()], &Config::default(), &mut output).unwrap();

    assert!(summary.failed_documents.is_empty());
    assert_eq!(output.lines("en"), ["Line one<br/>Line two"]);
    assert_eq!(output.lines("tok.en"), ["Line one Line two"]);
    assert_eq!(output.lines("tok.de"), ["Zeile eins Zeile zwei"]);
}
