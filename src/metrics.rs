use std::sync::LazyLock;

use prometheus::*;

static METRIC_CACHE_OUTCOME: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "im_embed_cache_count",
        "count of embedding cache lookups by outcome",
        &["outcome"]
    )
    .unwrap()
});

static METRIC_EMBED_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "im_embed_duration",
        "duration of the per-image embedding request in seconds",
        &["size", "source"]
    )
    .unwrap()
});

/// 增加缓存查找结果计数
pub fn inc_cache_outcome(outcome: &str) {
    METRIC_CACHE_OUTCOME.with_label_values(&[outcome]).inc();
}

/// 记录单次嵌入请求耗时，source 为 cache 或 model
pub fn observe_embed_duration(size: (u32, u32), source: &str, duration: f32) {
    let size = to_fixed_size(size);

    METRIC_EMBED_DURATION.with_label_values(&[size, source]).observe(duration as f64);
}

/// 将图像面积范围调整到几个固定值
fn to_fixed_size((width, height): (u32, u32)) -> &'static str {
    let area = width * height;
    if area <= 128 * 128 {
        "128"
    } else if area <= 256 * 256 {
        "256"
    } else if area <= 512 * 512 {
        "512"
    } else if area <= 768 * 768 {
        "768"
    } else if area <= 1024 * 1024 {
        "1024"
    } else if area <= 1536 * 1536 {
        "1536"
    } else if area <= 2048 * 2048 {
        "2048"
    } else {
        "2048+"
    }
}
