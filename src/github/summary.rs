// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository summaries returned by the resource proxy.
//!
//! Private repositories never leak their name or description: the name is
//! replaced by `private-<id>` and the description is dropped. Public entries
//! pass through unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::Repository;

/// Pseudonym for a private repository.
pub fn pseudonym(repository_id: u64) -> String {
    format!("private-{repository_id}")
}

/// One repository as exposed to the browser.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryView {
    pub id: u64,
    /// Real name for public repositories, `private-<id>` otherwise.
    pub name: String,
    pub private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<&Repository> for RepositoryView {
    fn from(repo: &Repository) -> Self {
        let (name, description) = if repo.private {
            (pseudonym(repo.id), None)
        } else {
            (repo.name.clone(), repo.description.clone())
        };

        Self {
            id: repo.id,
            name,
            private: repo.private,
            description,
            language: repo.language.clone(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            updated_at: repo.updated_at.clone(),
        }
    }
}

/// Aggregate view of an owner's repositories.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub owner: String,
    pub total_count: usize,
    pub public_count: usize,
    pub private_count: usize,
    pub total_stars: u64,
    pub total_forks: u64,
    /// Repository count per primary language.
    pub languages: BTreeMap<String, usize>,
    pub repositories: Vec<RepositoryView>,
}

impl RepositorySummary {
    /// Summarize the repositories whose owner matches `owner`
    /// (case-insensitive). Others are ignored.
    pub fn build(owner: &str, repositories: &[Repository]) -> Self {
        let owned: Vec<&Repository> = repositories
            .iter()
            .filter(|repo| repo.owner.login.eq_ignore_ascii_case(owner))
            .collect();

        let private_count = owned.iter().filter(|repo| repo.private).count();
        let mut languages = BTreeMap::new();
        for language in owned.iter().filter_map(|repo| repo.language.as_deref()) {
            *languages.entry(language.to_string()).or_insert(0) += 1;
        }

        Self {
            owner: owner.to_string(),
            total_count: owned.len(),
            public_count: owned.len() - private_count,
            private_count,
            total_stars: owned.iter().map(|repo| repo.stargazers_count).sum(),
            total_forks: owned.iter().map(|repo| repo.forks_count).sum(),
            languages,
            repositories: owned.into_iter().map(RepositoryView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::RepositoryOwner;

    fn repo(id: u64, name: &str, private: bool, owner: &str, language: Option<&str>) -> Repository {
        Repository {
            id,
            name: name.to_string(),
            private,
            owner: RepositoryOwner {
                login: owner.to_string(),
            },
            description: Some(format!("about {name}")),
            language: language.map(str::to_string),
            stargazers_count: id,
            forks_count: 1,
            updated_at: None,
        }
    }

    #[test]
    fn private_names_are_pseudonymized() {
        let summary = RepositorySummary::build(
            "octocat",
            &[
                repo(42, "secret-repo", true, "octocat", Some("Rust")),
                repo(7, "hello-world", false, "octocat", Some("Rust")),
            ],
        );

        let private = &summary.repositories[0];
        assert_eq!(private.name, "private-42");
        assert!(private.description.is_none());

        let public = &summary.repositories[1];
        assert_eq!(public.name, "hello-world");
        assert_eq!(public.description.as_deref(), Some("about hello-world"));

        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("secret-repo"));
    }

    #[test]
    fn counts_and_languages_cover_owned_repositories_only() {
        let summary = RepositorySummary::build(
            "OctoCat",
            &[
                repo(1, "a", false, "octocat", Some("Rust")),
                repo(2, "b", true, "Octocat", Some("Go")),
                repo(3, "c", false, "octocat", Some("Rust")),
                repo(4, "d", false, "octocat", None),
                repo(5, "fork-of-other", false, "someone-else", Some("C")),
            ],
        );

        assert_eq!(summary.total_count, 4);
        assert_eq!(summary.public_count, 3);
        assert_eq!(summary.private_count, 1);
        assert_eq!(summary.total_stars, 1 + 2 + 3 + 4);
        assert_eq!(summary.total_forks, 4);
        assert_eq!(summary.languages.get("Rust"), Some(&2));
        assert_eq!(summary.languages.get("Go"), Some(&1));
        assert!(!summary.languages.contains_key("C"));
    }

    #[test]
    fn summary_serializes_camel_case() {
        let json = serde_json::to_value(RepositorySummary::build("x", &[])).unwrap();
        assert_eq!(json["totalCount"], 0);
        assert_eq!(json["privateCount"], 0);
        assert!(json["repositories"].as_array().unwrap().is_empty());
    }
}
