fn main() -> std::process::ExitCode {
    shortlens_lib::run()
}
