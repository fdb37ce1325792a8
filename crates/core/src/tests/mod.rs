pub mod default;

pub fn setup_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();

    // Another test may have installed it already.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
