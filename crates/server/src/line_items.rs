//! Mapping helpers shared by the document endpoints.

use api_types::{DocumentListQuery, GroupBucketView, LineItemNew, LineItemView};
use engine::{DocumentGroupBy, DocumentListFilter, GroupBucket, LineItem, LineItemInput, MoneyCents};

use crate::ServerError;

pub fn to_engine_items(items: Vec<LineItemNew>) -> Vec<LineItemInput> {
    items
        .into_iter()
        .map(|item| LineItemInput {
            description: item.description,
            product: item.product,
            quantity: item.quantity,
            unit_price: MoneyCents::new(item.unit_price_minor),
            tax_rate: item.tax_rate,
        })
        .collect()
}

pub fn map_item(item: LineItem) -> LineItemView {
    LineItemView {
        id: item.id,
        position: item.position,
        description: item.description,
        product: item.product,
        quantity: item.quantity,
        unit_price_minor: item.unit_price.cents(),
        tax_rate: item.tax_rate,
        total_minor: item.total.cents(),
        sales_order_id: item.sales_order_id,
        expense_id: item.expense_id,
    }
}

pub fn map_buckets(buckets: Vec<GroupBucket>) -> Vec<GroupBucketView> {
    buckets
        .into_iter()
        .map(|bucket| GroupBucketView {
            key: bucket.key,
            count: bucket.count,
            total_minor: bucket.total.cents(),
        })
        .collect()
}

/// Turn the shared query parameters into an engine filter.
///
/// `status` is split on commas; the values themselves are validated by
/// the engine against the document's own status set.
pub fn parse_list_query(query: DocumentListQuery) -> Result<DocumentListFilter, ServerError> {
    let statuses = query.status.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    });
    let group_by = query
        .group_by
        .as_deref()
        .map(DocumentGroupBy::try_from)
        .transpose()?;

    Ok(DocumentListFilter {
        statuses,
        project_id: query.project_id,
        from: query.from,
        to: query.to,
        search: query.q,
        group_by,
    })
}
