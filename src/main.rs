/// Binary entrypoint for the `stickerkit` executable.
///
/// Keeps the binary thin: all logic lives in the `stickerkit_lib` crate so
/// tests can import library functions directly.
fn main() -> std::process::ExitCode {
    stickerkit_lib::run()
}
