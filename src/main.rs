//! Replay a captured AMQP frame stream and print each delivery.
//!
//! Frames are read from a file or standard input; diagnostics go to
//! standard error so the delivery listing can be piped.

mod cli;

use std::{
    error::Error,
    fs::File,
    io::{self, Read, Write},
    process::ExitCode,
};

use amqpframe::{
    ConsumerConfig,
    DeliveryConsumer,
    FrameSource,
    ReaderSource,
    delivery::Delivery,
    error::best_effort,
};
use clap::Parser;

fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = cli::Cli::parse();
    #[cfg(feature = "metrics")]
    let prometheus = cli.metrics.then(install_recorder).flatten();
    #[cfg(not(feature = "metrics"))]
    if cli.metrics {
        tracing::warn!("built without the metrics feature; --metrics ignored");
    }

    let status = match run(&cli) {
        Ok(count) => {
            tracing::info!(deliveries = count, "finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    };

    #[cfg(feature = "metrics")]
    if let Some(handle) = prometheus {
        eprint!("{}", handle.render());
    }
    status
}

#[cfg(feature = "metrics")]
fn install_recorder() -> Option<metrics_exporter_prometheus::PrometheusHandle> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .inspect_err(|err| tracing::warn!("metrics recorder unavailable: {err}"))
        .ok()
}

fn run(cli: &cli::Cli) -> Result<usize, Box<dyn Error>> {
    let reader: Box<dyn Read> = match &cli.input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin().lock()),
    };
    let config = ConsumerConfig::default()
        .max_frame_length(cli.max_frame_length)
        .max_body_size(cli.max_body_size);
    let mut source = ReaderSource::with_config(reader, &config);
    replay(&mut source, &config, cli.count, &mut io::stdout().lock())
}

/// Print up to `limit` deliveries (all when zero), then close `source`
/// whether or not the replay succeeded.
fn replay<R: Read>(
    source: &mut ReaderSource<R>,
    config: &ConsumerConfig,
    limit: usize,
    out: &mut impl Write,
) -> Result<usize, Box<dyn Error>> {
    let mut consumer = DeliveryConsumer::with_config(&mut *source, config);
    let outcome = print_deliveries(&mut consumer, limit, out);
    best_effort(source.close());
    outcome
}

fn print_deliveries<S: FrameSource>(
    consumer: &mut DeliveryConsumer<S>,
    limit: usize,
    out: &mut impl Write,
) -> Result<usize, Box<dyn Error>> {
    let mut count = 0;
    while limit == 0 || count < limit {
        let Some(delivery) = consumer.next_delivery()? else {
            break;
        };
        print_delivery(out, &delivery)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

fn print_delivery(out: &mut impl Write, delivery: &Delivery) -> io::Result<()> {
    writeln!(
        out,
        "delivery {} exchange={:?} routing_key={:?} redelivered={} correlation_id={:?} body={:?}",
        delivery.delivery_tag,
        String::from_utf8_lossy(&delivery.exchange),
        String::from_utf8_lossy(&delivery.routing_key),
        delivery.redelivered,
        String::from_utf8_lossy(delivery.properties.correlation_id()),
        String::from_utf8_lossy(&delivery.body),
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use amqpframe::{ConsumerConfig, ReaderSource, error::AmqpError, properties::PropertyBag};
    use amqpframe_testing::{CHANNEL, connection_close, deliver, delivery, encode_frames};

    use super::replay;

    /// The first bytes of a frame header, never completed.
    const PARTIAL_FRAME: &[u8] = &[3, 0, 1];

    fn with_partial_tail(mut wire: Vec<u8>) -> ReaderSource<Cursor<Vec<u8>>> {
        wire.extend_from_slice(PARTIAL_FRAME);
        ReaderSource::new(Cursor::new(wire))
    }

    #[test]
    fn source_is_closed_after_printing() {
        let wire = encode_frames(&delivery(5, PropertyBag::new(), b"hi", 8));
        let mut source = with_partial_tail(wire);
        let mut out = Vec::new();

        let count =
            replay(&mut source, &ConsumerConfig::default(), 1, &mut out).expect("one delivery");

        assert_eq!(count, 1);
        assert!(String::from_utf8_lossy(&out).starts_with("delivery 5 "));
        assert_eq!(source.buffered(), 0);
    }

    #[test]
    fn source_is_closed_when_the_broker_closes() {
        let wire = encode_frames(&[deliver(CHANNEL, 5), connection_close(320, "shutdown")]);
        let mut source = with_partial_tail(wire);
        let mut out = Vec::new();

        let err = replay(&mut source, &ConsumerConfig::default(), 0, &mut out)
            .expect_err("connection closed mid-delivery");

        assert!(matches!(
            err.downcast_ref::<AmqpError>(),
            Some(AmqpError::ProtocolClose { .. })
        ));
        assert!(out.is_empty());
        assert_eq!(source.buffered(), 0);
    }
}
