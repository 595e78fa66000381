use log::info;

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(site_frontend::config::log_level()).expect("error initializing log");

    info!("Starting site frontend");
    site_frontend::start();
}
