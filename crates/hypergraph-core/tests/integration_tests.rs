//! Hypergraph Core Integration Tests
//!
//! Every scenario runs against both storage backends.

use std::sync::Arc;

use hypergraph_core::{
    Error, Result,
    domain::graph::{
        Attributes, GraphStore, HyperGraphService, ListOptions, NavigationRequest,
        OrganizationContext, RecordFilter, ScalingConfig, ScalingLevel, attributes_from_value,
        parse_entity_from_path, project_entity, projection_content,
    },
    infrastructure::graph::InMemoryGraphStore,
    storage::{Database, export_projections, import_projections},
};
use serde_json::json;

fn memory_service() -> HyperGraphService<dyn GraphStore> {
    HyperGraphService::new(Arc::new(InMemoryGraphStore::new()) as Arc<dyn GraphStore>)
}

async fn sqlite_service() -> HyperGraphService<dyn GraphStore> {
    let db = Database::in_memory().await.expect("Failed to create database");
    HyperGraphService::new(Arc::new(db.graph_store()) as Arc<dyn GraphStore>)
}

async fn services() -> Vec<(&'static str, HyperGraphService<dyn GraphStore>)> {
    vec![
        ("memory", memory_service()),
        ("sqlite", sqlite_service().await),
    ]
}

fn attrs(value: serde_json::Value) -> Attributes {
    attributes_from_value(value).expect("attributes must be an object")
}

#[tokio::test]
async fn test_worked_example() -> Result<()> {
    for (backend, service) in services().await {
        let e1 = service.create_entity("Dev", Attributes::new(), None).await?;
        let e2 = service.create_entity("Dev", Attributes::new(), None).await?;
        let e3 = service.create_entity("Proj", Attributes::new(), None).await?;
        let r1 = service
            .create_relation("WorksOn", &e1.id, &e3.id, Attributes::new(), None)
            .await?;

        let graph = service
            .navigate(&NavigationRequest::new(&e1.id).with_depth(1))
            .await?;
        assert_eq!(graph.entity_ids(), vec![e1.id.as_str(), e3.id.as_str()], "{}", backend);
        assert_eq!(graph.relation_ids(), vec![r1.id.as_str()], "{}", backend);

        let all = service.full_hypergraph().await?;
        assert!(all.contains_entity(&e2.id));
        let compressed = service
            .scale(
                &all,
                &ScalingConfig::compress(ScalingLevel::Folder),
                &OrganizationContext::new("1", "default"),
            )
            .await;

        assert_eq!(
            compressed.entity_ids(),
            vec!["aggregated_Dev", "aggregated_Proj"],
            "{}",
            backend
        );
        assert_eq!(compressed.entities[0].attributes["count"], 2);
        assert_eq!(compressed.entities[1].attributes["count"], 1);
        assert!(compressed.metadata.version.ends_with("-compressed"));

        // Compression never writes back
        assert_eq!(service.stats().await?.total_entities, 3, "{}", backend);
    }
    Ok(())
}

#[tokio::test]
async fn test_filters_are_conjunctive_and_ordered() -> Result<()> {
    for (backend, service) in services().await {
        let a = service
            .create_entity("Dev", attrs(json!({"lang": "rust", "level": 3})), Some("acme".into()))
            .await?;
        service
            .create_entity("Dev", attrs(json!({"lang": "go"})), Some("acme".into()))
            .await?;
        service
            .create_entity("Proj", attrs(json!({"lang": "rust"})), Some("acme".into()))
            .await?;
        let d = service
            .create_entity("Dev", attrs(json!({"lang": "rust"})), Some("acme".into()))
            .await?;
        service
            .create_entity("Dev", attrs(json!({"lang": "rust"})), Some("globex".into()))
            .await?;

        let filter = RecordFilter::new()
            .with_organization("acme")
            .with_type("Dev")
            .with_attribute("lang", "rust");
        let found = service.list_entities(&ListOptions::new(filter.clone())).await?;
        let ids: Vec<_> = found.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), d.id.as_str()], "{}", backend);

        // Missing attribute key never matches
        let missing = RecordFilter::new().with_attribute("level", 3).with_type("Proj");
        assert!(service.list_entities(&ListOptions::new(missing)).await?.is_empty());

        let second_page = service
            .list_entities(&ListOptions::new(filter.clone()).with_offset(1).with_limit(5))
            .await?;
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].id, d.id);

        let past_end = service
            .list_entities(&ListOptions::new(filter).with_offset(10))
            .await?;
        assert!(past_end.is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn test_pagination_is_stable() -> Result<()> {
    for (backend, service) in services().await {
        for i in 0..7 {
            service
                .create_entity("Item", attrs(json!({ "n": i })), None)
                .await?;
        }

        let all = service.list_entities(&ListOptions::default()).await?;
        let mut paged = Vec::new();
        for offset in (0..7).step_by(3) {
            paged.extend(
                service
                    .list_entities(&ListOptions::default().with_offset(offset).with_limit(3))
                    .await?,
            );
        }
        assert_eq!(paged, all, "{}", backend);
        assert!(service
            .list_entities(&ListOptions::default().with_limit(0))
            .await?
            .is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn test_scoped_reads_and_updates() -> Result<()> {
    for (backend, service) in services().await {
        let relation = service
            .create_relation("Knows", "x", "y", attrs(json!({"since": 2019})), Some("acme".into()))
            .await?;

        assert!(service.get_relation(&relation.id, Some("acme")).await?.is_some());
        assert!(service.get_relation(&relation.id, Some("globex")).await?.is_none());

        let updated = service
            .update_relation(&relation.id, &attrs(json!({"strength": "high"})))
            .await?;
        assert_eq!(updated.attributes["since"], 2019, "{}", backend);
        assert_eq!(updated.attributes["strength"], "high");
        assert_eq!(updated.created_at, relation.created_at);

        let err = service
            .update_entity("missing", &Attributes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EntityNotFound(_)));
    }
    Ok(())
}

#[tokio::test]
async fn test_concurrent_patches_are_not_lost() -> Result<()> {
    for (backend, service) in services().await {
        let service = Arc::new(service);
        let entity = service.create_entity("Counter", Attributes::new(), None).await?;

        let mut handles = Vec::new();
        for i in 0..10 {
            let service = Arc::clone(&service);
            let id = entity.id.clone();
            let mut patch = Attributes::new();
            patch.insert(format!("k{}", i), json!(i));
            handles.push(tokio::spawn(async move { service.update_entity(&id, &patch).await }));
        }
        for handle in handles {
            handle.await.expect("task panicked")?;
        }

        let stored = service.get_entity(&entity.id, None).await?.expect("entity exists");
        assert_eq!(stored.attributes.len(), 10, "{}", backend);
    }
    Ok(())
}

#[tokio::test]
async fn test_navigation_on_cycles_and_dangling_ids() -> Result<()> {
    for (backend, service) in services().await {
        let a = service.create_entity("N", Attributes::new(), None).await?;
        let b = service.create_entity("N", Attributes::new(), None).await?;
        service.create_relation("Next", &a.id, &b.id, Attributes::new(), None).await?;
        service.create_relation("Next", &b.id, &a.id, Attributes::new(), None).await?;
        service.create_relation("Next", &b.id, "ghost", Attributes::new(), None).await?;

        let graph = service
            .navigate(&NavigationRequest::new(&a.id).with_depth(5))
            .await?;
        assert_eq!(graph.entities.len(), 2, "{}", backend);
        assert_eq!(graph.relations.len(), 3, "{}", backend);

        let only_start = service
            .navigate(&NavigationRequest::new(&a.id).with_depth(0))
            .await?;
        assert_eq!(only_start.entity_ids(), vec![a.id.as_str()]);
        assert!(only_start.relations.is_empty());

        // Deleting an entity leaves its relations in place
        assert!(service.delete_entity(&b.id).await?);
        let after = service.navigate(&NavigationRequest::new(&a.id)).await?;
        assert_eq!(after.entity_ids(), vec![a.id.as_str()]);
        assert_eq!(after.relations.len(), 2);
    }
    Ok(())
}

#[tokio::test]
async fn test_projection_round_trip_through_files() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let ctx = OrganizationContext::new("1", "acme");

    let source = sqlite_service().await;
    let dev = source
        .create_entity("Developer", attrs(json!({"name": "Ada"})), Some("acme".into()))
        .await?;
    let proj = source.create_entity("Project", Attributes::new(), None).await?;
    source
        .create_relation("WorksOn", &dev.id, &proj.id, Attributes::new(), Some("acme".into()))
        .await?;

    let projection = project_entity(&dev, &ctx);
    assert_eq!(
        projection.path,
        format!("acme/acme/entities/Developer/{}.json", dev.id)
    );
    assert_eq!(
        parse_entity_from_path(&projection.path, &projection_content(&projection)?)?,
        Some(dev.clone())
    );

    let graph = source.full_hypergraph().await?;
    export_projections(temp_dir.path(), &graph, &ctx)?;

    let imported = import_projections(temp_dir.path())?;
    let target = memory_service();
    let summary = target.import_hypergraph(&imported.graph).await?;

    assert_eq!(summary.entities_imported, 2);
    assert_eq!(summary.relations_imported, 1);
    assert_eq!(target.get_entity(&dev.id, Some("acme")).await?, Some(dev));
    Ok(())
}
