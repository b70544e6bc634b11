fn main() {
    // Generates `$OUT_DIR/built.rs`, recorded in the model metadata sidecar
    built::write_built_file().expect("Failed to generate build info");
}
