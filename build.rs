fn main() {
    // A .env file is optional; it can pre-seed SCHOLARLENS_* overrides
    // (simulated delays, camera facing) for development builds.
    if dotenvy::dotenv().is_err() {
        println!("cargo:warning=No .env file found, using system environment variables");
    }

    tauri_build::build()
}
