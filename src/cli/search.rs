// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{bail, Result};
use clap::Args;

use crate::activities::{AgeRange, DateRange, RequestContext, SearchQuery};

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text activity query
    #[arg(long)]
    pub query: String,

    /// Place name to search in
    #[arg(long)]
    pub location: Option<String>,

    /// Minimum age filter
    #[arg(long, requires = "max_age")]
    pub min_age: Option<u32>,

    /// Maximum age filter
    #[arg(long, requires = "min_age")]
    pub max_age: Option<u32>,

    /// Start date in yyyy-MM-dd
    #[arg(long, requires = "end_date")]
    pub start_date: Option<String>,

    /// End date in yyyy-MM-dd
    #[arg(long, requires = "start_date")]
    pub end_date: Option<String>,
}

impl SearchArgs {
    /// Build and validate the query this invocation describes
    fn to_query(&self) -> Result<SearchQuery> {
        let mut query = SearchQuery::new(self.query.clone());
        query.location = self.location.clone();
        if let (Some(min), Some(max)) = (self.min_age, self.max_age) {
            query.age_range = Some(AgeRange { min, max });
        }
        if let (Some(start), Some(end)) = (self.start_date.clone(), self.end_date.clone()) {
            query.date_range = Some(DateRange {
                start_date: start,
                end_date: end,
            });
        }
        if query.is_blank() {
            bail!("query must not be blank");
        }
        query.validate().map_err(anyhow::Error::msg)?;
        Ok(query)
    }
}

/// Run one search and print the activities as JSON.
///
/// This is an operator path: admission checks are skipped and pipeline
/// failures surface as errors instead of collapsing to an empty list.
pub async fn run(args: SearchArgs) -> Result<()> {
    let query = args.to_query()?;
    let parts = super::assemble_service().await?;

    let ctx = RequestContext::new("cli", None);
    let activities = parts.service.run_pipeline(&ctx, &query).await?;
    println!("{}", serde_json::to_string_pretty(&activities)?);
    Ok(())
}
