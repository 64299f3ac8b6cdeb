//! ListCatalogHandler - Catalog passthrough.

use std::sync::Arc;

use super::access::MerchantAccess;
use crate::domain::foundation::{DomainError, OrganizationId};
use crate::ports::{CatalogPage, MerchantGateway};

/// Query for one page of the merchant's catalog.
#[derive(Debug, Clone)]
pub struct ListCatalogQuery {
    pub organization_id: OrganizationId,
    pub cursor: Option<String>,
}

/// Handler forwarding catalog reads to the merchant gateway.
pub struct ListCatalogHandler {
    access: Arc<MerchantAccess>,
    gateway: Arc<dyn MerchantGateway>,
}

impl ListCatalogHandler {
    pub fn new(access: Arc<MerchantAccess>, gateway: Arc<dyn MerchantGateway>) -> Self {
        Self { access, gateway }
    }

    pub async fn handle(&self, query: ListCatalogQuery) -> Result<CatalogPage, DomainError> {
        let token = self.access.access_token(&query.organization_id).await?;
        let page = self
            .gateway
            .list_catalog(&token, query.cursor.as_deref())
            .await?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        connected, InMemoryConnectionRepository, MockMerchantGateway,
    };
    use crate::domain::foundation::ErrorCode;

    #[tokio::test]
    async fn forwards_catalog_page() {
        let org = OrganizationId::new();
        let gateway = MockMerchantGateway::new();
        let access = Arc::new(MerchantAccess::new(
            InMemoryConnectionRepository::with(connected(org)),
            gateway.clone(),
        ));
        let handler = ListCatalogHandler::new(access, gateway);

        let page = handler
            .handle(ListCatalogQuery {
                organization_id: org,
                cursor: None,
            })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Espresso");
    }

    #[tokio::test]
    async fn requires_connection() {
        let gateway = MockMerchantGateway::new();
        let access = Arc::new(MerchantAccess::new(
            InMemoryConnectionRepository::new(),
            gateway.clone(),
        ));
        let handler = ListCatalogHandler::new(access, gateway);

        let err = handler
            .handle(ListCatalogQuery {
                organization_id: OrganizationId::new(),
                cursor: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ConnectionNotFound);
    }
}
