use kubeman::KubemanConfig;

fn main() {
    // $KUBEMAN_CONFIG, ~/.kubeman/config.yaml, or the built-in defaults
    fluvio_future::subscriber::init_tracer(None);
    let config = KubemanConfig::load().expect("Load failed");

    println!("{config:#?}");
    println!("dashboard: {}", config.dashboard.url());
}
