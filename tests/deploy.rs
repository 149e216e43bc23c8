//! Container recipe checks that need neither a server nor a database.

use pretty_assertions::assert_eq;

const DOCKERFILE: &str = include_str!("../Dockerfile");

fn version(text: &str) -> Vec<u32> {
    text.split('.').filter_map(|part| part.parse().ok()).collect()
}

#[test]
fn builder_meets_rust_version() {
    let builder = DOCKERFILE
        .lines()
        .find(|line| line.starts_with("FROM rust:"))
        .expect("Expect a rust builder stage");
    let tag = builder
        .trim_start_matches("FROM rust:")
        .split(|c: char| c == '-' || c.is_whitespace())
        .next()
        .unwrap();

    assert!(version(tag) >= version(env!("CARGO_PKG_RUST_VERSION")), "builder {tag} is too old");
}

#[test]
fn runtime_contract() {
    assert!(DOCKERFILE.contains("postgresql-client"));
    assert!(DOCKERFILE.contains("mkdir -p /app/data"));
    assert!(DOCKERFILE.contains("EXPOSE 8000"));

    let cmd = DOCKERFILE.lines().last().unwrap();
    assert_eq!(cmd, r#"CMD ["currypot_api", "serve"]"#);
}
