

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::filter::PersonFilter;
use super::input::{SearchAttribute, SearchDirectoryInput};
use super::query_generator::QueryGenerator;
use super::reducer::{BucketMap, ResultReducer};
use super::synchronizer::{query_digest, QuerySynchronizer};
use crate::core::cache::ObjectStore;
use crate::core::config::DirectoryConfig;
use crate::core::error::Result;
use crate::pws::PersonDirectory;


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput {
    pub description: String,
    pub buckets: BucketMap,
    pub duplicate_hit_count: usize,
}

impl SearchOutput {
    pub fn num_results(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }
}


/// Results depend on who is asking, so authenticated searches hash to a
/// different id than anonymous ones.
#[derive(Serialize)]
struct QueryKey<'a> {
    #[serde(flatten)]
    input: &'a SearchDirectoryInput,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    authenticated: bool,
}


/// Runs the candidate queries for one request against the directory, in
/// order and one page at a time, and reduces everything into buckets.
pub struct DirectorySearchService<D: PersonDirectory> {
    directory: D,
    page_size: u32,
    fuzziness: f64,
    authenticated: bool,
}

impl<D: PersonDirectory> DirectorySearchService<D> {
    pub fn new(directory: D, config: &DirectoryConfig) -> Self {
        Self {
            directory,
            page_size: config.page_size,
            fuzziness: config.fuzziness,
            authenticated: false,
        }
    }

    /// Authenticated callers may see student records.
    pub fn with_authentication(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub async fn search(&self, input: SearchDirectoryInput) -> Result<SearchOutput> {
        let started = Instant::now();
        let input = input.validated()?;

        let Some(attribute) = input.attribute() else {
            debug!("Empty search request");
            return Ok(SearchOutput::default());
        };
        let description = attribute.describe();

        // A wildcard term is sent verbatim, so its single candidate is the bucket.
        let mut reducer = match &attribute {
            SearchAttribute::Name(name) if !name.contains('*') => ResultReducer::for_name(name, self.fuzziness),
            _ => ResultReducer::for_scenario(),
        };
        let filter = PersonFilter::new(input.population, input.include_test_identities, self.authenticated);
        let generator = QueryGenerator::new(self.authenticated, self.page_size);

        let mut num_requests = 0usize;
        for (ordinal, candidate) in generator.generate(&input).enumerate() {
            debug!("Querying \"{}\"", candidate.description);
            let mut page = self.directory.list_persons(&candidate.request_input).await?;
            num_requests += 1;

            loop {
                let next = page.next_href().map(str::to_string);
                let persons = filter.apply(std::mem::take(&mut page.persons), &candidate.constraints);
                reducer.reduce_page(&candidate.description, ordinal as u32, persons);

                let Some(href) = next else { break };
                page = self.directory.get_next_page(&href).await?;
                num_requests += 1;
            }
        }

        let duplicate_hit_count = reducer.duplicate_hit_count();
        let output = SearchOutput {
            description,
            buckets: reducer.finish(),
            duplicate_hit_count,
        };

        info!(
            "Search for {} returned {} results in {} buckets ({} requests, {} duplicates) in {}ms",
            output.description,
            output.num_results(),
            output.buckets.len(),
            num_requests,
            duplicate_hit_count,
            started.elapsed().as_millis()
        );
        Ok(output)
    }

    /// Like `search`, but identical concurrent requests wait for one worker
    /// and reuse its cached payload.
    pub async fn search_synchronized<S: ObjectStore>(
        &self,
        input: SearchDirectoryInput,
        synchronizer: &QuerySynchronizer<S>,
    ) -> Result<SearchOutput> {
        let input = input.validated()?;
        let query_id = query_digest(&QueryKey {
            input: &input,
            authenticated: self.authenticated,
        })?;

        if synchronizer.attach(&query_id).await {
            if let Some(payload) = synchronizer.store().get(&query_id) {
                match serde_json::from_str::<SearchOutput>(&payload) {
                    Ok(output) => {
                        info!("Returning cached results for query {}", query_id);
                        return Ok(output);
                    }
                    Err(e) => warn!("Discarding unreadable cached results for {}: {}", query_id, e),
                }
            }
        }

        synchronizer
            .run(&query_id, async {
                let output = self.search(input.clone()).await?;
                let payload = serde_json::to_string(&output)?;
                synchronizer
                    .store()
                    .put(&query_id, &payload, Some(synchronizer.settings().completed_ttl()));
                Ok(output)
            })
            .await
    }
}
