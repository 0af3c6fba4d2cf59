// 使用 mimalloc 作为全局内存分配器
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() {
    if let Err(e) = travelbook::run().await {
        tracing::error!(error = %e, "server exited with error");
        eprintln!("travelbook: {e}");
        std::process::exit(1);
    }
}
