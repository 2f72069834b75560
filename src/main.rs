fn main() {
    jsvet::cli::run();
}
