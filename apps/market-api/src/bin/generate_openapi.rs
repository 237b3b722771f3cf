use utoipa::OpenApi;

fn main() {
    let spec = market_api::routes::ApiDoc::openapi()
        .to_pretty_json()
        .expect("openapi document serializes");
    let out = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../specs/market-api.json");
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).expect("failed to create specs directory");
    }
    std::fs::write(&out, spec).expect("failed to write openapi document");
    println!("Wrote {}", out.display());
}
