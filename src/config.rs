#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    /// Root directory for served static content, uploads land below it.
    pub content_root: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let port = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(8000);
        let content_root =
            std::env::var("CONTENT_ROOT").unwrap_or_else(|_| "wwwroot".to_string());

        Config {
            database_url,
            jwt_secret,
            port,
            content_root,
        }
    }
}
