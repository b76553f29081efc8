//! Create phase: categories, customizations, menu items, then the links
//! between menu items and customizations.
//!
//! Each stage folds over its items one at a time, recording an
//! [`ItemOutcome`] per item. Only stage-ending conditions are returned as
//! [`SeedError`].

use std::collections::HashMap;

use serde_json::json;

use menuseed_core::{Category, CollectionId, Customization, MenuItem, RecordId};
use menuseed_store::{unique_id, AssetFetcher, Fields, Query, StoreError};

use crate::error::{Resource, SeedError};
use crate::reconciler::list_all_documents;
use crate::report::{EntityKind, ItemOutcome, RunReport, Stage};
use crate::uploader::AssetUploader;
use crate::verifier::Target;

/// Natural key → store id, for one entity kind within one run.
pub type IdMap = HashMap<String, RecordId>;

/// A menu item that made it into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SeededMenuItem<'d> {
    pub item: &'d MenuItem,
    pub id: RecordId,
}

pub struct Seeder<'a> {
    target: Target<'a>,
    fetcher: &'a dyn AssetFetcher,
    page_size: u32,
}

impl<'a> Seeder<'a> {
    pub fn new(target: Target<'a>, fetcher: &'a dyn AssetFetcher, page_size: u32) -> Self {
        Self {
            target,
            fetcher,
            page_size,
        }
    }

    // -- categories ----------------------------------------------------------

    /// Any category create failure ends the run.
    pub fn seed_categories(
        &self,
        categories: &[Category],
        report: &mut RunReport,
    ) -> Result<IdMap, SeedError> {
        let stage = Stage::SeedingCategories;
        let collection = &self.target.collections.categories;
        let mut map = IdMap::new();

        for category in categories {
            if map.contains_key(&category.name) {
                let outcome = ItemOutcome::Skipped {
                    reason: "duplicate category name".to_string(),
                };
                tracing::warn!("skipping category '{}': duplicate name", category.name);
                report.record(EntityKind::Category, &category.name, &outcome);
                continue;
            }
            let mut fields = Fields::new();
            fields.insert("name".into(), json!(category.name));
            fields.insert("description".into(), json!(category.description));

            let doc = self
                .create(collection, &fields)
                .map_err(|source| SeedError::Create {
                    stage,
                    item: category.name.clone(),
                    source,
                })?;
            report.record(
                EntityKind::Category,
                &category.name,
                &ItemOutcome::Created { id: doc.clone() },
            );
            map.insert(category.name.clone(), doc);
        }

        if map.is_empty() {
            return Err(SeedError::EmptyResult { stage });
        }
        tracing::info!("{stage}: {} created", map.len());
        Ok(map)
    }

    // -- customizations ------------------------------------------------------

    /// Existing customizations are adopted by name before anything is created,
    /// so reruns never duplicate them.
    pub fn seed_customizations(
        &self,
        customizations: &[Customization],
        report: &mut RunReport,
    ) -> Result<IdMap, SeedError> {
        let stage = Stage::SeedingCustomizations;
        let collection = &self.target.collections.customizations;

        let existing = list_all_documents(self.target.documents, collection, self.page_size)
            .map_err(|source| SeedError::List {
                stage,
                resource: Resource::Collection(collection.clone()),
                source,
            })?;
        let mut map = IdMap::new();
        for doc in existing {
            if let Some(name) = doc.str_field("name") {
                map.entry(name.to_string()).or_insert(doc.id);
            }
        }
        tracing::debug!("{stage}: {} already present", map.len());

        for custom in customizations {
            let outcome = match map.get(&custom.name) {
                Some(id) => ItemOutcome::Reused { id: id.clone() },
                None => self.create_customization(collection, custom),
            };
            if let Some(id) = outcome.id() {
                map.entry(custom.name.clone()).or_insert_with(|| id.clone());
            }
            log_outcome(EntityKind::Customization, &custom.name, &outcome);
            report.record(EntityKind::Customization, &custom.name, &outcome);
        }

        if map.is_empty() {
            return Err(SeedError::EmptyResult { stage });
        }
        tracing::info!(
            "{stage}: {} created, {} reused",
            report.customizations.created,
            report.customizations.reused
        );
        Ok(map)
    }

    fn create_customization(
        &self,
        collection: &CollectionId,
        custom: &Customization,
    ) -> ItemOutcome {
        if let Err(reason) = validate_customization(custom) {
            return ItemOutcome::Skipped {
                reason: format!("validation: {reason}"),
            };
        }
        let mut fields = Fields::new();
        fields.insert("name".into(), json!(custom.name));
        fields.insert("price".into(), json!(custom.price));
        fields.insert("type".into(), json!(custom.kind.as_str()));

        let err = match self.create(collection, &fields) {
            Ok(id) => return ItemOutcome::Created { id },
            Err(e) => e,
        };
        tracing::debug!("create of '{}' failed ({err}), re-querying by name", custom.name);
        match self.find_by_name(collection, &custom.name) {
            Ok(Some(id)) => ItemOutcome::Reused { id },
            // A 409 with nothing under this name means the generated id clashed.
            Ok(None) if err.is_conflict() => {
                tracing::debug!("'{}': id collision, retrying under a fresh id", custom.name);
                match self.create(collection, &fields) {
                    Ok(id) => ItemOutcome::Created { id },
                    Err(retry) => ItemOutcome::Failed {
                        reason: retry.to_string(),
                    },
                }
            }
            Ok(None) => ItemOutcome::Failed {
                reason: err.to_string(),
            },
            Err(lookup) => ItemOutcome::Failed {
                reason: format!("{err}; lookup by name failed: {lookup}"),
            },
        }
    }

    fn find_by_name(
        &self,
        collection: &CollectionId,
        name: &str,
    ) -> Result<Option<RecordId>, StoreError> {
        let hits = self
            .target
            .documents
            .list_documents(collection, &[Query::equal("name", name), Query::limit(1)])?;
        Ok(hits.documents.into_iter().next().map(|d| d.id))
    }

    // -- menu items ----------------------------------------------------------

    /// The category is resolved before the image is uploaded, so a skipped
    /// item never leaves an orphaned file behind.
    pub fn seed_menu<'d>(
        &self,
        menu: &'d [MenuItem],
        categories: &IdMap,
        report: &mut RunReport,
    ) -> Result<Vec<SeededMenuItem<'d>>, SeedError> {
        let stage = Stage::SeedingMenu;
        let collection = &self.target.collections.menu;
        let uploader = AssetUploader::new(self.target.objects, self.fetcher, self.target.bucket);
        let mut seeded = Vec::new();

        for item in menu {
            let Some(category_id) = categories.get(&item.category_name) else {
                let outcome = ItemOutcome::Skipped {
                    reason: format!("unknown category '{}'", item.category_name),
                };
                log_outcome(EntityKind::MenuItem, &item.name, &outcome);
                report.record(EntityKind::MenuItem, &item.name, &outcome);
                continue;
            };

            let image_url = match uploader.upload(&item.image_url) {
                Ok(asset) => asset.view_url,
                Err(e) => {
                    tracing::warn!("'{}': keeping source image URL: {e}", item.name);
                    report.record_fallback(&item.name, e.to_string());
                    item.image_url.clone()
                }
            };

            let mut fields = Fields::new();
            fields.insert("name".into(), json!(item.name));
            fields.insert("description".into(), json!(item.description));
            fields.insert("image_url".into(), json!(image_url));
            fields.insert("price".into(), json!(item.price));
            fields.insert("rating".into(), json!(item.rating));
            fields.insert("calories".into(), json!(item.calories));
            fields.insert("protein".into(), json!(item.protein));
            fields.insert("categories".into(), json!(category_id.as_str()));

            let outcome = match self.create(collection, &fields) {
                Ok(id) => {
                    seeded.push(SeededMenuItem {
                        item,
                        id: id.clone(),
                    });
                    ItemOutcome::Created { id }
                }
                Err(e) => ItemOutcome::Failed {
                    reason: e.to_string(),
                },
            };
            log_outcome(EntityKind::MenuItem, &item.name, &outcome);
            report.record(EntityKind::MenuItem, &item.name, &outcome);
        }

        if seeded.is_empty() {
            return Err(SeedError::EmptyResult { stage });
        }
        tracing::info!("{stage}: {} created", seeded.len());
        Ok(seeded)
    }

    // -- links ---------------------------------------------------------------

    /// Never fatal: unknown names are skipped and failed creates are counted.
    pub fn seed_links(
        &self,
        menu: &[SeededMenuItem<'_>],
        customizations: &IdMap,
        report: &mut RunReport,
    ) {
        let collection = &self.target.collections.menu_customizations;
        for seeded in menu {
            for name in &seeded.item.customizations {
                let label = format!("{} → {name}", seeded.item.name);
                let outcome = match customizations.get(name) {
                    None => ItemOutcome::Skipped {
                        reason: format!("unknown customization '{name}'"),
                    },
                    Some(custom_id) => {
                        let mut fields = Fields::new();
                        fields.insert("menu".into(), json!(seeded.id.as_str()));
                        fields.insert("customizations".into(), json!(custom_id.as_str()));
                        match self.create(collection, &fields) {
                            Ok(id) => ItemOutcome::Created { id },
                            Err(e) => ItemOutcome::Failed {
                                reason: e.to_string(),
                            },
                        }
                    }
                };
                log_outcome(EntityKind::Link, &label, &outcome);
                report.record(EntityKind::Link, &label, &outcome);
            }
        }
        tracing::info!(
            "{}: {} created",
            Stage::SeedingLinks,
            report.links.created
        );
    }

    fn create(&self, collection: &CollectionId, fields: &Fields) -> Result<RecordId, StoreError> {
        self.target
            .documents
            .create_document(collection, &unique_id(), fields)
            .map(|doc| doc.id)
    }
}

/// Field checks applied before a customization is sent to the store.
pub fn validate_customization(custom: &Customization) -> Result<(), String> {
    if custom.name.trim().is_empty() {
        return Err("name is empty".to_string());
    }
    if !custom.price.is_finite() || custom.price < 0.0 {
        return Err(format!("price must be >= 0, got {}", custom.price));
    }
    if custom.kind.as_str().trim().is_empty() {
        return Err("type is empty".to_string());
    }
    Ok(())
}

fn log_outcome(entity: EntityKind, item: &str, outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Created { id } => tracing::debug!("{entity} '{item}' created as {id}"),
        ItemOutcome::Reused { id } => tracing::debug!("{entity} '{item}' reused {id}"),
        ItemOutcome::Skipped { reason } => tracing::warn!("{entity} '{item}' skipped: {reason}"),
        ItemOutcome::Failed { reason } => tracing::warn!("{entity} '{item}' failed: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use menuseed_core::{BucketId, Collections, CustomizationType};
    use menuseed_store::memory::{InMemoryStore, Op, StaticFetcher};
    use rstest::rstest;

    use super::*;

    fn custom(name: &str, price: f64, kind: &str) -> Customization {
        Customization {
            name: name.to_string(),
            price,
            kind: CustomizationType::from(kind.to_string()),
        }
    }

    #[rstest]
    #[case(custom("Bacon", 1.5, "topping"), true)]
    #[case(custom("Free", 0.0, "side"), true)]
    #[case(custom("", 1.0, "topping"), false)]
    #[case(custom("Cheap", -1.0, "topping"), false)]
    #[case(custom("Weird", f64::NAN, "topping"), false)]
    #[case(custom("Blank", 1.0, ""), false)]
    fn customization_validation(#[case] input: Customization, #[case] ok: bool) {
        assert_eq!(validate_customization(&input).is_ok(), ok);
    }

    #[test]
    fn duplicate_category_names_are_skipped() {
        let collections = Collections::default();
        let bucket = BucketId::from("assets");
        let store = InMemoryStore::with_resources(
            collections.in_dependency_order(),
            std::iter::once(&bucket),
        );
        let fetcher = StaticFetcher::new();
        let target = Target {
            documents: &store,
            objects: &store,
            collections: &collections,
            bucket: &bucket,
        };
        let cat = Category {
            name: "Burgers".into(),
            description: "Buns".into(),
        };
        let mut report = RunReport::new();
        let map = Seeder::new(target, &fetcher, 100)
            .seed_categories(&[cat.clone(), cat], &mut report)
            .expect("categories");
        assert_eq!(map.len(), 1);
        assert_eq!(report.categories.created, 1);
        assert_eq!(report.categories.skipped, 1);
        assert_eq!(store.documents(&collections.categories).len(), 1);
    }

    #[test]
    fn category_create_failure_is_fatal() {
        let collections = Collections::default();
        let bucket = BucketId::from("assets");
        let store = InMemoryStore::with_resources(
            collections.in_dependency_order(),
            std::iter::once(&bucket),
        );
        store.fail_create_where(&collections.categories, "name", "Pizzas");
        let fetcher = StaticFetcher::new();
        let target = Target {
            documents: &store,
            objects: &store,
            collections: &collections,
            bucket: &bucket,
        };
        let cats = ["Burgers", "Pizzas"].map(|n| Category {
            name: n.into(),
            description: String::new(),
        });
        let err = Seeder::new(target, &fetcher, 100)
            .seed_categories(&cats, &mut RunReport::new())
            .unwrap_err();
        assert!(matches!(err, SeedError::Create { ref item, .. } if item == "Pizzas"));
        assert_eq!(err.stage(), Stage::SeedingCategories);
    }

    #[rstest]
    #[case(1, 1, 0)]
    #[case(2, 0, 1)]
    fn id_collision_is_retried_once_under_a_fresh_id(
        #[case] conflicts: usize,
        #[case] created: usize,
        #[case] failed: usize,
    ) {
        let collections = Collections::default();
        let bucket = BucketId::from("assets");
        let store = InMemoryStore::with_resources(
            collections.in_dependency_order(),
            std::iter::once(&bucket),
        );
        store.conflict_create_where(&collections.customizations, "name", "Bacon", conflicts);
        let fetcher = StaticFetcher::new();
        let target = Target {
            documents: &store,
            objects: &store,
            collections: &collections,
            bucket: &bucket,
        };
        let mut report = RunReport::new();
        let result = Seeder::new(target, &fetcher, 100).seed_customizations(
            &[custom("Bacon", 1.5, "topping"), custom("Fries", 2.0, "side")],
            &mut report,
        );

        let map = result.expect("Fries always lands");
        assert_eq!(map.contains_key("Bacon"), created == 1);
        assert_eq!(report.customizations.created, 1 + created);
        assert_eq!(report.customizations.failed, failed);
        assert_eq!(report.customizations.reused, 0);
        let attempts = store
            .journal()
            .iter()
            .filter(|op| matches!(op, Op::CreateDocument(c, _) if *c == collections.customizations))
            .count();
        assert_eq!(attempts, 3);
        let bacon = store
            .documents(&collections.customizations)
            .iter()
            .filter(|d| d.str_field("name") == Some("Bacon"))
            .count();
        assert_eq!(bacon, created);
    }
}
