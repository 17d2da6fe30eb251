// src/main.rs
fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    if let Err(e) = book_reader::app::boot() {
        log::error!("reader failed to start: {}", e);
    }
}
