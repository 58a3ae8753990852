pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        frontend_url: String,
        content_url: Option<String>,
        image_hosts: Option<Vec<String>>,
    },
}
