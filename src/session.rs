/// Display name of the joined user; absent while unjoined.
pub const USER_NAME: &str = "user_name";
