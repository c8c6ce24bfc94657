pub mod session {

    pub const USER_ID: &str = "user_id";

    pub const REGISTRATION: &str = "registration_data";

    pub const RESET: &str = "reset_data";
}

pub mod limits {

    /// JSON bodies carry base64 selfies and candidate photos.
    pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
}

pub mod sitemap {

    /// Public pages listed in sitemap.xml, with change frequency and priority.
    pub const PAGES: &[(&str, &str, &str)] = &[("/", "weekly", "1.0")];
}

pub mod messages {

    pub const REGISTRATION_EXPIRED: &str = "Session expired. Please start registration again.";

    pub const RESET_EXPIRED: &str = "Session expired. Please request a reset again.";
}
