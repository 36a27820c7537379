//! Compile-time configuration loaded via `toml-cfg`.

#[toml_cfg::toml_config]
pub struct Settings {
    #[default("0.0.0.0")]
    pub rtp_listen_addr: &'static str,
    #[default(5004)]
    pub rtp_port: u16,
    // 0 picks a random SSRC at startup
    #[default(14375)]
    pub rtp_ssrc: u32,
    // echo, log or cache; echo also needs remote_addr
    #[default("log")]
    pub consumer: &'static str,
    #[default("")]
    pub remote_addr: &'static str,
    #[default(5004)]
    pub remote_port: u16,
}
