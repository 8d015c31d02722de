// src/services/download.rs

//! Direct download of puzzle files.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::formats::{ContainerFormat, puz};
use crate::models::{Record, SourceConfig, Technique};
use crate::services::{FetchContext, Strategy};
use crate::utils::render;
use crate::utils::url::{content_disposition_file_name, path_file_name, rewrite_share_link};

/// Download `link` and save it if it turns out to be a puzzle.
///
/// The file name comes from the URL path when that names a container,
/// otherwise from `Content-Disposition`. Binary containers are decoded
/// before saving so a broken file is reported instead of kept; XML
/// containers are saved as they are. Returns `None` when the response is
/// not recognisably a puzzle.
pub async fn download_puzzle(ctx: &FetchContext, link: &str) -> Result<Option<PathBuf>> {
    let url = rewrite_share_link(link);
    let response = ctx.fetcher.get(&url).await?;

    let file_name = path_file_name(&url)
        .filter(|name| ContainerFormat::from_name(name).is_some())
        .or_else(|| {
            response
                .header("content-disposition")
                .and_then(content_disposition_file_name)
        });

    let Some(file_name) = file_name else {
        log::debug!("No puzzle file name for {url}");
        return Ok(None);
    };

    match ContainerFormat::from_name(&file_name) {
        Some(ContainerFormat::Binary) => {
            puz::decode(&response.body, link)?;
            let path = ctx.storage.save_puzzle(&file_name, &response.body).await?;
            Ok(Some(path))
        }
        Some(ContainerFormat::Xml) => {
            let path = ctx.storage.save_puzzle(&file_name, &response.body).await?;
            Ok(Some(path))
        }
        None => {
            log::debug!("{file_name} from {url} is not a puzzle container");
            Ok(None)
        }
    }
}

/// Download the source's direct link, rendered for today.
pub struct DirectDownload;

#[async_trait]
impl Strategy for DirectDownload {
    fn name(&self) -> &'static str {
        "direct download"
    }

    fn applies(&self, source: &SourceConfig) -> bool {
        source.technique == Technique::DirectDownload
    }

    async fn attempt(
        &self,
        ctx: &FetchContext,
        source: &SourceConfig,
        today: NaiveDate,
    ) -> Result<Vec<Record>> {
        let template = source
            .direct_link()
            .ok_or_else(|| AppError::config(format!("{} has no direct link", source.name)))?;
        let link = render(template, &Record::default(), today);

        log::info!("Downloading {link}");
        Ok(download_puzzle(ctx, &link)
            .await?
            .map(Record::with_file)
            .into_iter()
            .collect())
    }
}
