use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{ImportError, ImportResult};
use crate::model::{
    Anstellung, Batch, Collection, HasRefLinks, NavigationRoot, Nutzniesser, NutzniesserRef,
    Organisation, OwnerKey, Personalkategorie, PersonalkategorieNav, StatistikCodeImport,
    StatistikCodeRef, Variable, VariablenRef,
};
use crate::observability::metrics::get_metrics;
use crate::sinks::{Sink, SinkOp};
use crate::sources::fetch::ResourceFetcher;
use crate::sources::link;
use crate::traversal::extensions::ExtensionPoint;
use crate::traversal::report::{BranchTally, DispatchCount, ImportMode, SyncReport};

const ORGANISATION_BRANCH: &str = "organisation";
const PERSONALKATEGORIE_BRANCH: &str = "personalkategorie";
const ANSTELLUNG_BRANCH: &str = "anstellung";

/// Walks the resource graph from the navigation root and hands every non-empty
/// collection to the sink, keyed by its owner.
pub struct TraversalEngine<S: Sink> {
    fetcher: ResourceFetcher,
    sink: Arc<S>,
    root_path: String,
    branch_limit: usize,
}

impl<S: Sink> Clone for TraversalEngine<S> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            sink: Arc::clone(&self.sink),
            root_path: self.root_path.clone(),
            branch_limit: self.branch_limit,
        }
    }
}

/// What the catalog step leaves for the rest of the walk
struct CatalogOutcome {
    organisations: Vec<Organisation>,
    variablen_changed: bool,
}

impl<S: Sink> TraversalEngine<S> {
    pub fn new(
        fetcher: ResourceFetcher,
        sink: Arc<S>,
        root_path: impl Into<String>,
        branch_limit: usize,
    ) -> Self {
        Self { fetcher, sink, root_path: root_path.into(), branch_limit: branch_limit.max(1) }
    }

    /// Catalogs, organisations with their personnel categories, and employments.
    /// Everything is saved append-only.
    pub async fn full_import(&self) -> ImportResult<SyncReport> {
        self.run(ImportMode::Full).await
    }

    /// Only the employment branch of the graph.
    pub async fn import_employment_assignments(&self) -> ImportResult<SyncReport> {
        self.run(ImportMode::EmploymentAssignments).await
    }

    /// Same walk as the full import, but every leaf collection is filtered with
    /// `changesSince` and replaces what the sink holds.
    pub async fn import_changes_since(&self, since: NaiveDate) -> ImportResult<SyncReport> {
        self.run(ImportMode::ChangesSince(since)).await
    }

    async fn run(&self, mode: ImportMode) -> ImportResult<SyncReport> {
        let metrics = get_metrics().await;
        let mut report = SyncReport::new(mode);
        info!(%mode, "import started");

        let result = match self.walk(mode, &mut report).await {
            Ok(()) if self.fetcher.cancellation().is_cancelled() => Err(ImportError::Cancelled),
            other => other,
        };
        report.complete();

        match result {
            Ok(()) => {
                let outcome = if report.has_errors() { "partial" } else { "ok" };
                metrics.import_runs.with_label_values(&[mode.as_str(), outcome]).inc();
                info!(
                    %mode,
                    outcome,
                    collections = report.dispatched.collections,
                    records = report.dispatched.records,
                    branches = report.branches_walked,
                    errors = report.errors.len(),
                    "import finished"
                );
                Ok(report)
            }
            Err(e) => {
                metrics.import_runs.with_label_values(&[mode.as_str(), "failed"]).inc();
                error!(%mode, error = %e, "import aborted");
                Err(e)
            }
        }
    }

    async fn walk(&self, mode: ImportMode, report: &mut SyncReport) -> ImportResult<()> {
        let root: NavigationRoot = self.fetcher.fetch_document(&self.root_path).await?;
        let since = mode.since();
        let op = mode.sink_op();
        // tripped by the first fatal branch failure, stops every sibling branch
        let halt = CancellationToken::new();

        if !mode.includes_catalogs() {
            let tally = self.walk_employments(root.anstellung_link.clone(), since, op, &halt).await;
            return self.absorb(report, tally).await;
        }

        let catalogs = self.import_catalogs(&root, since, op, report).await?;

        let (organisations, employments) = tokio::join!(
            self.walk_organisations(catalogs.organisations, since, op, &halt),
            self.walk_employments(root.anstellung_link.clone(), since, op, &halt),
        );
        self.absorb(report, organisations).await?;
        self.absorb(report, employments).await?;

        self.invoke_extensions(&root, mode, catalogs.variablen_changed, report);
        Ok(())
    }

    /// Moves branch failures into the report; a fatal one ends the run.
    async fn absorb(&self, report: &mut SyncReport, tally: BranchTally) -> ImportResult<()> {
        let metrics = get_metrics().await;
        report.branches_walked += tally.walked;
        report.dispatched += tally.dispatched;

        for (branch, e) in tally.failures {
            if e.is_fatal() {
                return Err(e);
            }
            let label = branch_label(&branch);
            metrics.branch_failures.with_label_values(&[label]).inc();
            warn!(branch = %branch, error = %e, "branch failed, continuing with siblings");
            report.add_error(&branch, &e);
        }
        Ok(())
    }

    async fn import_catalogs(
        &self,
        root: &NavigationRoot,
        since: Option<NaiveDate>,
        op: SinkOp,
        report: &mut SyncReport,
    ) -> ImportResult<CatalogOutcome> {
        let f = &self.fetcher;
        let (statistik_codes, nutzniesser, variablen, organisationen, personalkategorien) = tokio::try_join!(
            f.fetch_collection_since::<StatistikCodeImport>(root.statistik_code_url.as_deref(), since),
            f.fetch_collection_since::<Nutzniesser>(root.nutzniesser_url.as_deref(), since),
            f.fetch_collection_since::<Variable>(root.variablen_url.as_deref(), since),
            f.fetch_collection_since::<Organisation>(root.organisation_url.as_deref(), since),
            f.fetch_collection_since::<Personalkategorie>(root.personalkategorie_url.as_deref(), since),
        )?;

        // an unchanged organisation can still own changed references
        let descent = match since {
            None => organisationen.clone(),
            Some(_) => f.fetch_collection::<Organisation>(root.organisation_url.as_deref()).await?,
        };
        let variablen_changed = !variablen.is_empty();

        for collection in [
            Collection::StatistikCodes(statistik_codes),
            Collection::Nutzniesser(nutzniesser),
            Collection::Variablen(variablen),
            Collection::Organisationen(organisationen),
            Collection::Personalkategorien(personalkategorien),
        ] {
            report.dispatched += self.dispatch(op, OwnerKey::Tenant, collection).await?;
        }

        Ok(CatalogOutcome { organisations: descent, variablen_changed })
    }

    async fn walk_organisations(
        &self,
        organisations: Vec<Organisation>,
        since: Option<NaiveDate>,
        op: SinkOp,
        halt: &CancellationToken,
    ) -> BranchTally {
        let limiter = Arc::new(Semaphore::new(self.branch_limit));
        let mut set = JoinSet::new();

        for organisation in organisations {
            let Some(permit) = self.next_permit(&limiter, halt).await else {
                break;
            };
            let engine = self.clone();
            spawn_branch(&mut set, permit, halt, async move {
                engine.walk_organisation(organisation, since, op).await
            });
        }

        collect_branches(set, ORGANISATION_BRANCH).await
    }

    async fn walk_organisation(
        &self,
        organisation: Organisation,
        since: Option<NaiveDate>,
        op: SinkOp,
    ) -> BranchTally {
        let mut tally = BranchTally { walked: 1, ..Default::default() };
        let key = OwnerKey::Organisation(organisation.id.clone());
        debug!(owner = %key, "walking organisation");

        match self.import_refs(&organisation, key.clone(), since, op).await {
            Ok(count) => tally.dispatched += count,
            Err(e) => tally.fail(&key, e),
        }
        if tally.has_fatal() {
            return tally;
        }

        // navigation list, never filtered: an unchanged category can own changed refs
        let categories = match self
            .fetcher
            .fetch_collection::<PersonalkategorieNav>(organisation.personalkategorie_url.as_deref())
            .await
        {
            Ok(categories) => categories,
            Err(e) => {
                tally.fail(format!("{}/personalkategorien", key), e);
                return tally;
            }
        };

        for category in categories {
            if self.fetcher.cancellation().is_cancelled() {
                break;
            }
            let sub_key = OwnerKey::OrganisationPersonalkategorie {
                organisation: organisation.id.clone(),
                personalkategorie: category.id.clone(),
            };
            tally.walked += 1;
            match self.import_refs(&category, sub_key.clone(), since, op).await {
                Ok(count) => tally.dispatched += count,
                Err(e) => tally.fail(&sub_key, e),
            }
            if tally.has_fatal() {
                break;
            }
        }
        tally
    }

    async fn walk_employments(
        &self,
        anstellung_link: Option<String>,
        since: Option<NaiveDate>,
        op: SinkOp,
        halt: &CancellationToken,
    ) -> BranchTally {
        let employments = match self.fetcher.fetch_collection::<Anstellung>(anstellung_link.as_deref()).await {
            Ok(employments) => employments,
            Err(e) => {
                let mut tally = BranchTally::default();
                tally.fail("anstellungen", e);
                if tally.has_fatal() {
                    halt.cancel();
                }
                return tally;
            }
        };

        let limiter = Arc::new(Semaphore::new(self.branch_limit));
        let mut set = JoinSet::new();

        for employment in employments {
            let Some(permit) = self.next_permit(&limiter, halt).await else {
                break;
            };
            let engine = self.clone();
            spawn_branch(&mut set, permit, halt, async move {
                let key = OwnerKey::Anstellung(employment.id.clone());
                let mut tally = BranchTally { walked: 1, ..Default::default() };
                match engine.import_refs(&employment, key.clone(), since, op).await {
                    Ok(count) => tally.dispatched += count,
                    Err(e) => tally.fail(&key, e),
                }
                tally
            });
        }

        collect_branches(set, ANSTELLUNG_BRANCH).await
    }

    /// Branch permit, or `None` once the run is cancelled or halted.
    async fn next_permit(
        &self,
        limiter: &Arc<Semaphore>,
        halt: &CancellationToken,
    ) -> Option<OwnedSemaphorePermit> {
        if self.fetcher.cancellation().is_cancelled() || halt.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = halt.cancelled() => None,
            permit = Arc::clone(limiter).acquire_owned() => permit.ok(),
        }
    }

    /// The three reference collections of one node, fetched together and
    /// dispatched under the node's key.
    async fn import_refs<N: HasRefLinks>(
        &self,
        node: &N,
        owner: OwnerKey,
        since: Option<NaiveDate>,
        op: SinkOp,
    ) -> ImportResult<DispatchCount> {
        let links = node.ref_links();
        let f = &self.fetcher;
        let (variablen, nutzniesser, statistik_codes) = tokio::try_join!(
            f.fetch_collection_since::<VariablenRef>(links.variablen, since),
            f.fetch_collection_since::<NutzniesserRef>(links.nutzniesser, since),
            f.fetch_collection_since::<StatistikCodeRef>(links.statistik_code, since),
        )?;

        let mut count = DispatchCount::default();
        for collection in [
            Collection::VariablenRefs(variablen),
            Collection::NutzniesserRefs(nutzniesser),
            Collection::StatistikCodeRefs(statistik_codes),
        ] {
            count += self.dispatch(op, owner.clone(), collection).await?;
        }
        Ok(count)
    }

    async fn dispatch(&self, op: SinkOp, owner: OwnerKey, collection: Collection) -> ImportResult<DispatchCount> {
        if collection.is_empty() {
            return Ok(DispatchCount::default());
        }
        let metrics = get_metrics().await;
        let kind = collection.kind();
        let records = collection.len();

        let duplicates = collection.duplicate_codes();
        if !duplicates.is_empty() {
            warn!(collection = %kind, owner = %owner, codes = ?duplicates, "duplicate codes in collection");
        }
        let inconsistent = collection.inconsistent_validity();
        if !inconsistent.is_empty() {
            warn!(collection = %kind, owner = %owner, codes = ?inconsistent, "validity ends before it starts");
        }

        let batch = Batch::new(owner, collection);
        if let Err(e) = op.apply(self.sink.as_ref(), &batch).await {
            metrics.sink_failures.with_label_values(&[kind.as_str()]).inc();
            return Err(ImportError::Sink(e));
        }

        metrics.sink_dispatches.with_label_values(&[kind.as_str(), op.as_str()]).inc();
        metrics.sink_records.with_label_values(&[kind.as_str()]).inc_by(records as u64);
        debug!(collection = %kind, owner = %batch.owner, records, op = op.as_str(), "dispatched");
        Ok(DispatchCount::one(records))
    }

    fn invoke_extensions(
        &self,
        root: &NavigationRoot,
        mode: ImportMode,
        variablen_changed: bool,
        report: &mut SyncReport,
    ) {
        let candidates = match mode {
            ImportMode::Full => vec![
                (ExtensionPoint::Mappings, root.mappings_url.as_deref()),
                (ExtensionPoint::Massnahmen, root.massnahmen_url.as_deref()),
            ],
            // mappings only move when variables did
            ImportMode::ChangesSince(_) if variablen_changed => {
                vec![(ExtensionPoint::Mappings, root.mappings_url.as_deref())]
            }
            _ => Vec::new(),
        };

        for (point, link) in candidates {
            if link::is_missing(link) {
                continue;
            }
            point.invoke(link.unwrap_or_default());
            report.extensions.push(point);
        }
    }
}

/// Runs one branch under its permit. A fatal failure trips `halt`, which drops the
/// in-flight work of every other branch sharing it.
fn spawn_branch<F>(
    set: &mut JoinSet<BranchTally>,
    permit: OwnedSemaphorePermit,
    halt: &CancellationToken,
    branch: F,
) where
    F: Future<Output = BranchTally> + Send + 'static,
{
    let halt = halt.clone();
    set.spawn(async move {
        let _permit = permit;
        tokio::select! {
            _ = halt.cancelled() => BranchTally::default(),
            tally = branch => {
                if tally.has_fatal() {
                    halt.cancel();
                }
                tally
            }
        }
    });
}

async fn collect_branches(mut set: JoinSet<BranchTally>, branch: &str) -> BranchTally {
    let mut tally = BranchTally::default();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(done) => tally.merge(done),
            Err(e) => tally.fail(branch, ImportError::from(e)),
        }
    }
    tally
}

/// Metric label for a branch key such as `organisation:O1/personalkategorie:P1`.
fn branch_label(branch: &str) -> &'static str {
    if branch.contains("personalkategorie") {
        PERSONALKATEGORIE_BRANCH
    } else if branch.starts_with(ORGANISATION_BRANCH) {
        ORGANISATION_BRANCH
    } else {
        ANSTELLUNG_BRANCH
    }
}
