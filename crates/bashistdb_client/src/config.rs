//! Client configuration.

/// Identity a session reports to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// User name sent with every request.
    pub user: String,
    /// Host name sent with every request.
    pub hostname: String,
}

impl ClientConfig {
    /// Creates a configuration for `user` on `hostname`.
    pub fn new(user: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            hostname: hostname.into(),
        }
    }

    /// Sets the user name.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Sets the host name.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = ClientConfig::new("alice", "laptop")
            .with_user("bob")
            .with_hostname("desktop");
        assert_eq!(config.user, "bob");
        assert_eq!(config.hostname, "desktop");
    }
}
