use retrying_request::{RequestOptions, RequestSpec, RetryRegistry, RetryingRequestInvoker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: fetch <url>"))?;
    let opts = RequestOptions::from_env()?;

    let spec = RequestSpec::new(url, |body| {
        println!("{body}");
    })
    .with_options(opts)?;

    let registry = RetryRegistry::new();
    let invoker = RetryingRequestInvoker::new(spec, &registry);

    let terminal = invoker.trigger().await?;
    println!("finished: {terminal:?}, registrations: {:?}", registry.registrations());

    Ok(())
}
