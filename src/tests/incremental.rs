#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use httpmock::MockServer;
    use tokio_util::sync::CancellationToken;

    use crate::model::{CollectionKind, OwnerKey};
    use crate::sinks::sink_file::FileSink;
    use crate::sinks::sink_memory::MemorySink;
    use crate::sinks::SinkOp;
    use crate::tests::common::{engine, json, mock_graph, mock_token, service_config, Graph, SINCE};
    use crate::traversal::ExtensionPoint;

    fn since() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 5, 15).unwrap()
    }

    fn with_mappings() -> Graph {
        let mut graph = Graph::default();
        graph.root["mappingsUrl"] = json!("/api/v1/mappings");
        graph.root["massnahmenUrl"] = json!("/api/v1/massnahmen");
        graph
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn changes_since_filters_leaves_and_replaces() {
        let server = MockServer::start_async().await;
        mock_token(&server, 3600).await;
        // catalog and ref mocks only answer when changesSince=2016-05-15 is present
        let mocks = mock_graph(&server, Graph::default(), Some(SINCE)).await;
        let config = service_config(&server, 30).await;
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&config, sink.clone(), CancellationToken::new());

        let report = engine.import_changes_since(since()).await.expect("incremental import");
        let calls = sink.calls().await;

        assert!(!report.has_errors(), "errors: {:?}", report.errors);
        assert_eq!(calls.len(), 16);
        assert!(calls.iter().all(|call| call.op == SinkOp::DeleteAndSave));

        // organisation list: once filtered for the catalog, once unfiltered to descend
        mocks[4].assert_calls_async(2).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn unchanged_owners_are_still_descended() {
        let server = MockServer::start_async().await;
        mock_token(&server, 3600).await;
        let _mocks = mock_graph(&server, Graph::default(), Some(SINCE)).await;
        let config = service_config(&server, 30).await;
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&config, sink.clone(), CancellationToken::new());

        engine.import_changes_since(since()).await.expect("incremental import");

        let category = OwnerKey::OrganisationPersonalkategorie {
            organisation: "O1".into(),
            personalkategorie: "P2".into(),
        };
        let kinds: Vec<CollectionKind> = sink.calls_for(&category).await.iter().map(|c| c.kind()).collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.contains(&CollectionKind::VariablenRefs));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn mappings_follow_changed_variables() {
        let server = MockServer::start_async().await;
        mock_token(&server, 3600).await;
        let _mocks = mock_graph(&server, with_mappings(), Some(SINCE)).await;
        let config = service_config(&server, 30).await;
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&config, sink.clone(), CancellationToken::new());

        let report = engine.import_changes_since(since()).await.expect("incremental import");

        // massnahmen are a full-import concern
        assert_eq!(report.extensions, vec![ExtensionPoint::Mappings]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn mappings_are_skipped_without_variable_changes() {
        let server = MockServer::start_async().await;
        mock_token(&server, 3600).await;
        let graph = Graph { variablen: json!([]), ..with_mappings() };
        let _mocks = mock_graph(&server, graph, Some(SINCE)).await;
        let config = service_config(&server, 30).await;
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&config, sink.clone(), CancellationToken::new());

        let report = engine.import_changes_since(since()).await.expect("incremental import");

        assert!(report.extensions.is_empty());
        assert_eq!(report.dispatched.collections, 15);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn repeated_incremental_import_is_idempotent() {
        let server = MockServer::start_async().await;
        mock_token(&server, 3600).await;
        let _mocks = mock_graph(&server, Graph::default(), Some(SINCE)).await;
        let config = service_config(&server, 30).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = Arc::new(FileSink::new(dir.path()));
        let engine = engine(&config, sink.clone(), CancellationToken::new());

        engine.import_changes_since(since()).await.expect("first run");
        let file = dir.path().join("variablen_refs").join("organisation_O1__personalkategorie_P1.jsonl");
        let first = tokio::fs::read_to_string(&file).await.expect("written");

        engine.import_changes_since(since()).await.expect("second run");
        let second = tokio::fs::read_to_string(&file).await.expect("still there");

        assert_eq!(first, second);
        assert_eq!(second.lines().count(), 2);
    }
}
