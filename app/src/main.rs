fn main() {
    let env = env_logger::Env::default()
        .filter_or("DIAL_BRIDGE_LOG", "info")
        .write_style_or("DIAL_BRIDGE_LOG_STYLE", "auto");

    env_logger::init_from_env(env);

    if let Err(err) = dial_bridge::run() {
        log::error!("app error: {err}");
        std::process::exit(1);
    }
}
