//! 发布到期的定时文章
//!
//! 由外部定时任务（如 cron）周期性调用，服务地址取自 `TRAVELBOOK_API`。

const DEFAULT_API: &str = "http://localhost:3000";

fn main() {
    if std::env::args().len() > 1 {
        eprintln!("Usage: publish-due");
        eprintln!("Set TRAVELBOOK_API to override the server base URL ({DEFAULT_API})");
        std::process::exit(1);
    }

    let base = std::env::var("TRAVELBOOK_API").unwrap_or_else(|_| DEFAULT_API.to_string());
    let url = format!("{}/api/admin/posts/publish-due", base.trim_end_matches('/'));

    let client = reqwest::blocking::Client::new();
    match client.post(&url).send() {
        Ok(resp) => {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            if !status.is_success() {
                eprintln!("publish-due rejected: {} | {}", status, text.trim());
                std::process::exit(1);
            }
            println!("{}", text.trim());
        }
        Err(e) => {
            eprintln!("failed to contact {url}: {e}");
            std::process::exit(1);
        }
    }
}
