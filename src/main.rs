fn main() {
    showdown_solver::cli::run();
}
