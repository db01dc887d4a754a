use std::fs;
use std::path::Path;
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

fn count_files_with_pattern(dir: &Path, pattern: &str) -> usize {
    let glob_pattern = format!("{}/{}", dir.to_string_lossy(), pattern);
    glob::glob(&glob_pattern)
        .expect("Failed to read glob pattern")
        .filter_map(Result::ok)
        .count()
}

fn build_deck(base_dir: &Path) -> std::path::PathBuf {
    let markdown_path = base_dir.join("deck.md");
    let html_path = base_dir.join("deck.html");
    fs::write(
        &markdown_path,
        "# Title\n\n# Code\n\n```rust reveal='1,1,1'\nlet a = 1;\nlet b = 2;\nlet c = 3;\n```\n",
    )
    .expect("Failed to write markdown file");

    let output = run_command(&[
        "build",
        "-i",
        markdown_path.to_str().unwrap(),
        "-o",
        html_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Build failed: {:?}", output);
    html_path
}

#[test]
#[ignore] // Ignore by default as it requires Chrome to be installed
fn test_render_step_images() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .is_test(true)
        .try_init();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let html_path = build_deck(temp_dir.path());
    let steps_dir = temp_dir.path().join("steps");

    // Leftovers from an earlier, longer render must not survive.
    fs::create_dir(&steps_dir).expect("Failed to create steps directory");
    fs::write(steps_dir.join("step_0009.png"), b"stale").expect("Failed to write stale image");

    let output = run_command(&[
        "render",
        "-i",
        html_path.to_str().unwrap(),
        "-o",
        steps_dir.to_str().unwrap(),
        "--width",
        "800",
        "--height",
        "600",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    // 1 title step + 3 reveal steps
    assert_eq!(count_files_with_pattern(&steps_dir, "step_*.png"), 4);
    assert!(steps_dir.join("step_0004.png").exists());
    assert!(!steps_dir.join("step_0009.png").exists());

    let (width, height) =
        image::image_dimensions(steps_dir.join("step_0001.png")).expect("Unreadable image");
    assert_eq!((width, height), (800, 600));
}

#[test]
#[ignore] // Ignore by default as it requires Chrome to be installed
fn test_render_pdf() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let html_path = build_deck(temp_dir.path());
    let pdf_path = temp_dir.path().join("out").join("deck.pdf");

    let output = run_command(&[
        "render",
        "-i",
        html_path.to_str().unwrap(),
        "--pdf",
        pdf_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let pdf = fs::read(&pdf_path).expect("PDF was not written");
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn test_render_requires_an_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let html_path = temp_dir.path().join("deck.html");
    fs::write(&html_path, "<html></html>").expect("Failed to write HTML file");

    let output = run_command(&["render", "-i", html_path.to_str().unwrap()]);
    assert!(!output.status.success(), "Command should have failed");
}
