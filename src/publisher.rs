// src/publisher.rs
//! One publish run: select → format → deliver.

use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::format::{MessageFormatter, TemplateKind};
use crate::notify::{deliver, DeliveryChannel, DeliveryError, DeliveryOutcome};
use crate::selector::ItemSelector;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub outcome: DeliveryOutcome,
    pub link: Option<String>,
    pub title: Option<String>,
}

pub struct Publisher {
    selector: ItemSelector,
    formatter: MessageFormatter,
    template: TemplateKind,
    channel: Arc<dyn DeliveryChannel>,
}

impl Publisher {
    pub fn new(
        selector: ItemSelector,
        formatter: MessageFormatter,
        template: TemplateKind,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self {
            selector,
            formatter,
            template,
            channel,
        }
    }

    pub fn selector(&self) -> &ItemSelector {
        &self.selector
    }

    /// A selected item stays claimed even if delivery ends in the notice;
    /// it is not offered again in this process.
    pub async fn publish_once(&self) -> Result<PublishReport, DeliveryError> {
        counter!("publish_runs_total").increment(1);

        let item = self.selector.select().await;
        let rendered = item
            .as_ref()
            .map(|it| self.formatter.format(it, self.template));

        let outcome = deliver(self.channel.as_ref(), rendered.as_ref(), &self.formatter).await?;

        let report = PublishReport {
            outcome,
            link: item.as_ref().map(|it| it.link.clone()),
            title: item.map(|it| it.title),
        };
        info!(
            target: "notify",
            channel = self.channel.name(),
            outcome = ?report.outcome,
            link = report.link.as_deref().unwrap_or("-"),
            "publish run finished"
        );
        Ok(report)
    }
}
