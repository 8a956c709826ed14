use evictkit::prelude::*;

fn main() -> Result<(), CacheError> {
    env_logger::init();

    let cache: LruCache<String> = CacheBuilder::new(2)
        .thread_name("demo-evictions")
        .build()?;

    cache.subscribe_fn(|key| {
        println!("evicted {key}");
        Ok(())
    });

    cache.put("alpha", "1".to_string())?;
    cache.put("beta", "2".to_string())?;

    if let Some(value) = cache.get("alpha") {
        println!("hit alpha: {}", value.as_str());
    }

    cache.put("gamma", "3".to_string())?;

    println!("contains beta? {}", cache.contains("beta"));

    // Waits for the notifier to deliver "beta".
    cache.dispose();
    Ok(())
}

// Expected output:
// hit alpha: 1
// contains beta? false
// evicted beta
//
// Explanation: capacity=2; after get("alpha"), alpha is MRU and beta is LRU.
// Putting gamma evicts beta. The notice is delivered on the notifier thread,
// so its line may print before or after "contains beta?".
