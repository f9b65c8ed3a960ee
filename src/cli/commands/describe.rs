use anyhow::Result;
use std::process::ExitCode;

use super::Command;
use crate::config::ApiForgeConfig;
use crate::relations::{MemoryGateway, RelationshipResolver};

pub struct DescribeCommand {
    pub entity: String,
    pub relation: String,
}

impl Command for DescribeCommand {
    fn execute(&self, config: &ApiForgeConfig) -> Result<ExitCode> {
        // Describing a relation never reads records, so no storage is attached.
        let gateway = MemoryGateway::new();
        let pivots = config.pivot_resolver();
        let resolver = RelationshipResolver::new(&self.entity, &gateway, &pivots)
            .with_catalog(&config.relations.catalog)
            .with_unlink_scope(config.relations.unlink_scope);

        let declared = config
            .relations
            .catalog
            .lookup(resolver.entity(), &self.relation)
            .is_some();
        let descriptor = resolver.describe(&self.relation);

        println!("{descriptor}");
        println!(
            "   Source: {}",
            if declared { "declared" } else { "probed" }
        );
        Ok(ExitCode::SUCCESS)
    }
}
