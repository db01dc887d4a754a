use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_command(args: &[&str]) -> Output {
    Command::new("cargo")
        .arg("run")
        .arg("--")
        .args(args)
        .output()
        .expect("Failed to execute command")
}

const DECK: &str = r#"% Stepped Code
% Test Author

# Intro

Some *intro* text.

# Reveal

```rust steps='0 _ _ | 0 1 _ | ..'
fn main() {
    println!("hello");
}
```

# Lines

```python line-by-line
a = 1
b = 2
```
"#;

#[test]
fn test_build_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    let markdown_path = temp_path.join("deck.md");
    fs::write(&markdown_path, DECK).expect("Failed to write markdown file");

    let css_path = temp_path.join("extra.css");
    fs::write(&css_path, "pre.code { color: #123456; }").expect("Failed to write CSS file");

    let output_path = temp_path.join("out").join("deck.html");

    let output = run_command(&[
        "build",
        "-i",
        markdown_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--css",
        css_path.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_path.exists(), "Output file was not created");

    let html_content = fs::read_to_string(&output_path).expect("Failed to read output file");

    // 1 intro step, 3 reveal steps, 2 line-by-line steps
    assert_eq!(html_content.matches("<section class=\"step\"").count(), 6);
    assert!(html_content.contains("<title>Stepped Code</title>"));
    assert!(html_content.contains("<meta name=\"author\" content=\"Test Author\">"));
    assert!(html_content.contains("<em>intro</em>"));
    assert!(html_content.contains("println!(&quot;hello&quot;);"));
    assert!(html_content.contains("\u{2800}"));
    assert!(html_content.contains("<style>pre.code { color: #123456; }</style>"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 slides, 6 steps"), "Unexpected output: {}", stdout);
}

#[test]
fn test_build_link_mode_and_size() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    let markdown_path = temp_path.join("deck.md");
    fs::write(&markdown_path, "# Only\n\nText\n").expect("Failed to write markdown file");
    let output_path = temp_path.join("deck.html");

    let output = run_command(&[
        "build",
        "-i",
        markdown_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--css",
        "https://example.com/theme.css",
        "--mode",
        "link",
        "--width",
        "1280",
        "--height",
        "720",
    ]);

    assert!(output.status.success(), "Command failed: {:?}", output);

    let html_content = fs::read_to_string(&output_path).expect("Failed to read output file");
    assert!(html_content.contains(r#"<link rel="stylesheet" href="https://example.com/theme.css">"#));
    assert!(html_content.contains("width: 1280px; height: 720px;"));
}

#[test]
fn test_build_rejects_bad_mask() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    let markdown_path = temp_path.join("deck.md");
    fs::write(
        &markdown_path,
        "# Broken\n\n```rust steps='0 _ | 0'\nline one\nline two\n```\n",
    )
    .expect("Failed to write markdown file");
    let output_path = temp_path.join("deck.html");

    let output = run_command(&[
        "build",
        "-i",
        markdown_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
    ]);

    assert!(!output.status.success(), "Command should have failed");
    assert!(!output_path.exists(), "No output should be written");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "Missing error message: {}", stderr);
}

#[test]
fn test_steps_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let markdown_path = temp_dir.path().join("deck.md");
    fs::write(&markdown_path, DECK).expect("Failed to write markdown file");

    let output = run_command(&["steps", "-i", markdown_path.to_str().unwrap()]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 steps  Reveal"), "Unexpected output: {}", stdout);
    assert!(stdout.contains("2 steps  Lines"), "Unexpected output: {}", stdout);
    assert!(stdout.contains("3 slides, 6 steps"), "Unexpected output: {}", stdout);
}

#[test]
fn test_preview_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let snippet_path = temp_dir.path().join("snippet.rs");
    fs::write(&snippet_path, "let a = 1;\nlet b = 2;\nlet c = a + b;\n")
        .expect("Failed to write snippet");

    let output = run_command(&[
        "preview",
        "-i",
        snippet_path.to_str().unwrap(),
        "--steps",
        r#"0 _ _ | 0 "let b = ?;" _ | .."#,
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = "--- step 1 ---\nlet a = 1;\n\u{2800}\n\u{2800}\n\
                    --- step 2 ---\nlet a = 1;\nlet b = ?;\n\u{2800}\n\
                    --- step 3 ---\nlet a = 1;\nlet b = 2;\nlet c = a + b;\n";
    assert_eq!(stdout, expected);
}

#[test]
fn test_preview_reveal_counts() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let snippet_path = temp_dir.path().join("snippet.py");
    fs::write(&snippet_path, "a\nb\nc\n").expect("Failed to write snippet");

    let output = run_command(&[
        "preview",
        "-i",
        snippet_path.to_str().unwrap(),
        "--reveal",
        "2,1",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("--- step").count(), 2);
    assert!(stdout.starts_with("--- step 1 ---\na\nb\n\u{2800}\n"));

    let output = run_command(&[
        "preview",
        "-i",
        snippet_path.to_str().unwrap(),
        "--reveal",
        "2,2",
    ]);
    assert!(!output.status.success(), "Revealing past the end should fail");
}

#[test]
fn test_build_links_images_from_another_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source_dir = temp_dir.path().join("talk");
    fs::create_dir_all(source_dir.join("img")).expect("Failed to create image directory");
    image::RgbImage::new(4, 4)
        .save(source_dir.join("img").join("diagram.png"))
        .expect("Failed to write image");

    let markdown_path = source_dir.join("deck.md");
    fs::write(&markdown_path, "# Diagram\n\n![diagram](img/diagram.png)\n")
        .expect("Failed to write markdown file");
    let output_path = temp_dir.path().join("site").join("deck.html");

    let output = run_command(&[
        "build",
        "-i",
        markdown_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--check-assets",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Checked 1 images"), "Unexpected output: {}", stdout);

    let html_content = fs::read_to_string(&output_path).expect("Failed to read output file");
    assert!(
        html_content.contains(r#"<img src="../talk/img/diagram.png" alt="diagram">"#),
        "Image is not linked relative to the output"
    );
}
