//! End-to-end pipeline: filter -> partition -> fetch -> resume.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use pageharvest::fetch::{FetchedPage, TransportFailure};
use pageharvest::lists::{discover_sublists, read_urls, write_sublists, write_urls, WriteMode};
use pageharvest::{
    partition, ContentStore, FetchScheduler, HarvestSummary, Identifier, PageFetcher, ProxyPool,
    ProxySlot, ResponseValidator, RetryPolicy, RunMode, SchedulerConfig, UrlClassifier,
};

/// Serves a valid company page for every URL except the ones it redirects.
#[derive(Default)]
struct FakeSite {
    calls: AtomicUsize,
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch(
        &self,
        url: &str,
        _proxy: Option<&ProxySlot>,
    ) -> Result<FetchedPage, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Pages under /moved/ report a different canonical URL.
        let canonical = if url.contains("/moved/") {
            "https://www.example.hu/company/elsewhere-kft/X1".to_string()
        } else {
            url.to_string()
        };
        let body = format!(
            "<!DOCTYPE html><html><head><title>Company profile</title>\
             <link rel=\"canonical\" href=\"{}\"></head><body>ok</body></html>",
            canonical
        );
        Ok(FetchedPage {
            status: 200,
            body: body.into_bytes(),
        })
    }
}

fn seed_urls() -> Vec<String> {
    let mut urls = Vec::new();
    for i in 0..12 {
        urls.push(format!("https://www.example.hu/company/firm{}-kft/K{}", i, i));
        urls.push(format!("https://www.example.hu/company/person{}/P{}", i, i));
    }
    urls.push("https://www.example.hu/moved/gone-zrt/Z1".to_string());
    urls
}

fn scheduler(
    fetcher: Arc<FakeSite>,
    store: &ContentStore,
) -> FetchScheduler<FakeSite> {
    FetchScheduler::new(
        fetcher,
        Arc::new(ProxyPool::direct()),
        store.clone(),
        ResponseValidator::default(),
        SchedulerConfig {
            workers: 3,
            sub_batch_size: 4,
            sub_batch_pause: Duration::from_millis(100),
            retry: RetryPolicy::new(2, Duration::from_millis(10)),
            mode: RunMode::Batch,
        },
    )
}

#[tokio::test(start_paused = true)]
async fn test_full_pipeline_with_resume() {
    let dir = TempDir::new().unwrap();
    let seed = dir.path().join("URL_LIST.csv");
    let filtered = dir.path().join("FILTERED_URL_LIST.csv");
    write_urls(&seed, &seed_urls(), WriteMode::Overwrite).unwrap();

    // Filter
    let classifier = UrlClassifier::new(["-kft", "-bt", "-zrt"], Vec::<String>::new()).unwrap();
    let kept = classifier.filter(&read_urls(&seed).unwrap());
    assert_eq!(kept.len(), 13);
    write_urls(&filtered, &kept, WriteMode::Overwrite).unwrap();

    // Partition
    let subs = partition(&read_urls(&filtered).unwrap(), 5).unwrap();
    write_sublists(dir.path(), "URL_LIST", &subs).unwrap();
    let found = discover_sublists(dir.path(), "URL_LIST").unwrap();
    assert_eq!(
        found.iter().map(|f| f.count).collect::<Vec<_>>(),
        vec![5, 5, 3]
    );

    // Fetch every sub-list
    let store = ContentStore::new(dir.path().join("Companies"));
    let fetcher = Arc::new(FakeSite::default());
    let mut total = HarvestSummary::default();
    for sub in &found {
        let urls = read_urls(&sub.path).unwrap();
        total += scheduler(fetcher.clone(), &store).run(&urls).await.unwrap();
    }
    assert_eq!(
        total,
        HarvestSummary {
            saved: 12,
            existed: 0,
            errored: 1
        }
    );
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 13);

    let stored = Identifier::from_url("https://www.example.hu/company/firm3-kft/K3").unwrap();
    assert_eq!(stored.as_str(), "firm3-kft_K3");
    assert!(store.path_for(&stored).starts_with(dir.path().join("Companies").join("FI")));
    assert!(store.exists(&stored));

    let rejected = Identifier::from_url("https://www.example.hu/moved/gone-zrt/Z1").unwrap();
    assert!(!store.exists(&rejected));

    // Resume: only the rejected URL is fetched again
    let resumed = Arc::new(FakeSite::default());
    let mut again = HarvestSummary::default();
    for sub in &found {
        let urls = read_urls(&sub.path).unwrap();
        again += scheduler(resumed.clone(), &store).run(&urls).await.unwrap();
    }
    assert_eq!(
        again,
        HarvestSummary {
            saved: 0,
            existed: 12,
            errored: 1
        }
    );
    assert_eq!(resumed.calls.load(Ordering::SeqCst), 1);
}
