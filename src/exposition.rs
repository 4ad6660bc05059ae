//! Prometheus text exposition.

use prometheus::proto;
use prometheus::{Encoder, TextEncoder};

use crate::metrics::{MetricFamily, MetricKind, Sample, SampleValue};

/// Content type of the text exposition format.
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Render families in the Prometheus text format.
///
/// Families without samples are skipped; the encoder rejects them.
pub fn render(families: &[MetricFamily]) -> Result<String, prometheus::Error> {
    let families: Vec<proto::MetricFamily> = families
        .iter()
        .filter(|family| !family.is_empty())
        .map(to_proto)
        .collect();

    TextEncoder::new().encode_to_string(&families)
}

fn to_proto(family: &MetricFamily) -> proto::MetricFamily {
    let mut mf = proto::MetricFamily::default();
    mf.set_name(family.name.clone());
    mf.set_help(family.help.clone());
    mf.set_field_type(match family.kind {
        MetricKind::Gauge => proto::MetricType::GAUGE,
        MetricKind::Histogram => proto::MetricType::HISTOGRAM,
    });

    for sample in &family.samples {
        mf.mut_metric().push(to_metric(&family.label_names, sample));
    }
    mf
}

fn to_metric(label_names: &[String], sample: &Sample) -> proto::Metric {
    let mut metric = proto::Metric::default();
    for (name, value) in label_names.iter().zip(&sample.label_values) {
        let mut pair = proto::LabelPair::default();
        pair.set_name(name.clone());
        pair.set_value(value.clone());
        metric.mut_label().push(pair);
    }

    match sample.value {
        SampleValue::Gauge(value) => {
            let mut gauge = proto::Gauge::default();
            gauge.set_value(value);
            metric.set_gauge(gauge);
        }
        SampleValue::Histogram { count, sum } => {
            let mut histogram = proto::Histogram::default();
            histogram.set_sample_count(count);
            histogram.set_sample_sum(sum);
            metric.set_histogram(histogram);
        }
    }
    metric
}
