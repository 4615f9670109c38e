//! Concurrency smoke test: independent uploads on independent workers

mod harness;

use harness::{payload, TestCluster};
use std::sync::Arc;

#[tokio::test]
async fn concurrent_uploads_of_distinct_files_all_round_trip() {
    let cluster = Arc::new(TestCluster::start(3, 32).await);
    let n = 8;

    let mut handles = Vec::new();
    for i in 0..n {
        let cluster = cluster.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("file-{}.bin", i);
            let data = payload(200 + i * 37);
            cluster.client.put_bytes(&name, &data).await.unwrap();
            (name, data)
        }));
    }

    for handle in handles {
        let (name, data) = handle.await.unwrap();
        assert_eq!(cluster.client.get_bytes(&name).await.unwrap(), data);
    }

    let names = cluster.client.list().await.unwrap();
    assert_eq!(names.len(), n);
}
