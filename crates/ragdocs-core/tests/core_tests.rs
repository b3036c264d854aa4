use std::fs;
use std::path::Path;
use tempfile::TempDir;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use ragdocs_core::config::{Config, RagSettings};
use ragdocs_core::data_processor::{extract_text_from_pdf, list_pdf_files, ChunkingConfig, DataProcessor};

fn write_pdf(path: &Path, text: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! { "Font" => dictionary! { "F1" => font_id } });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn extracts_text_from_generated_pdf() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sky.pdf");
    write_pdf(&path, "The sky is blue.");

    let text = extract_text_from_pdf(&path);
    let normalised = text.split_whitespace().collect::<Vec<_>>().join(" ");
    assert!(normalised.contains("The sky is blue."), "extracted: {normalised:?}");
}

#[test]
fn broken_pdf_is_treated_as_empty() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.pdf");
    fs::write(&path, b"definitely not a pdf").unwrap();
    assert!(extract_text_from_pdf(&path).is_empty());
    assert!(extract_text_from_pdf(&tmp.path().join("missing.pdf")).is_empty());
}

#[test]
fn lists_only_top_level_pdfs() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("b.pdf"), b"x").unwrap();
    fs::write(dir.join("a.PDF"), b"x").unwrap();
    fs::write(dir.join("notes.txt"), b"x").unwrap();
    fs::create_dir(dir.join("nested")).unwrap();
    fs::write(dir.join("nested/c.pdf"), b"x").unwrap();

    let files = list_pdf_files(dir).unwrap();
    let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
    assert_eq!(names, vec!["a.PDF", "b.pdf"]);
}

#[test]
fn process_directory_tolerates_bad_files() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_pdf(&dir.join("good.pdf"), "alpha bravo charlie");
    fs::write(dir.join("bad.pdf"), b"garbage").unwrap();

    let processor = DataProcessor::with_chunking(ChunkingConfig::new(2, 0).unwrap()).unwrap();
    let chunks = processor.process_directory(dir).expect("process");

    assert_eq!(chunks.len(), 2, "bad.pdf contributes nothing, good.pdf splits in two");
    assert!(chunks.iter().all(|c| c.source == "good.pdf"));
    assert_eq!(chunks[0].position, 0);
    assert_eq!(chunks[1].position, 1);
}

#[test]
fn process_directory_requires_existing_dir() {
    let tmp = TempDir::new().unwrap();
    let processor = DataProcessor::new();
    assert!(processor.process_directory(&tmp.path().join("nope")).is_err());
}

#[test]
fn config_layers_file_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file(
            "config.toml",
            r#"
                chunk_size = 500
                overlap = 50
                embed_model = "from-file"
            "#,
        )?;
        jail.create_file("config.test.toml", "overlap = 60")?;
        jail.set_env("RAG_EMBED_MODEL", "from-env");
        jail.set_env("RAG_INDEX_PATH", "/srv/idx");
        jail.set_env("OPENAI_API_KEY", "sk-test");

        let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.chunk_size, 500);
        assert_eq!(settings.overlap, 60);
        assert_eq!(settings.embed_model, "from-env");
        assert_eq!(settings.index_path, Path::new("/srv/idx"));
        assert_eq!(settings.api_key(), Some("sk-test"));
        assert_eq!(settings.meta_path, RagSettings::default().meta_path);
        Ok(())
    });
}

#[test]
fn config_rejects_invalid_chunking() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file("config.toml", "chunk_size = 10\noverlap = 10")?;
        assert!(Config::load().is_err());
        Ok(())
    });
}

#[test]
fn blank_api_key_counts_as_unset() {
    let settings = RagSettings { openai_api_key: Some("  ".into()), ..RagSettings::default() };
    assert_eq!(settings.api_key(), None);
}
