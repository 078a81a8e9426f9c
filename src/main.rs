#[tokio::main]
async fn main() {
    if let Err(error) = post_planner_lib::run().await {
        log::error!("{}", error);
        eprintln!("{}", error);
        std::process::exit(1);
    }
}
