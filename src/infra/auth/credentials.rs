use crate::config::LoginConfig;
use crate::usecase::ports::auth::Authenticator;

/// Single account taken from the config file.
pub struct ConfiguredCredentials {
    username: String,
    password: String,
}

impl ConfiguredCredentials {
    pub fn new(login: &LoginConfig) -> Self {
        Self {
            username: login.username.clone(),
            password: login.password.clone(),
        }
    }
}

impl Authenticator for ConfiguredCredentials {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        username.trim() == self.username && password == self.password
    }
}
