//! Promotional banners.

use crate::model::banner::{BannerAd, NewBannerAd};
use crate::repo::banner_repo::BannerAdRepository;
use crate::service::ServiceResult;
use uuid::Uuid;

pub struct BannerService<R> {
    repo: R,
}

impl<R: BannerAdRepository> BannerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn active_banners(&self) -> ServiceResult<Vec<BannerAd>> {
        Ok(self.repo.list_active_banners()?)
    }

    pub fn create_banner(&self, banner: &NewBannerAd) -> ServiceResult<BannerAd> {
        Ok(self.repo.create_banner(banner)?)
    }

    pub fn set_banner_active(&self, id: Uuid, active: bool) -> ServiceResult<()> {
        Ok(self.repo.set_banner_active(id, active)?)
    }
}

#[cfg(test)]
mod tests {
    use super::BannerService;
    use crate::db::open_db_in_memory;
    use crate::model::banner::NewBannerAd;
    use crate::repo::SqliteStore;
    use crate::service::ServiceError;
    use uuid::Uuid;

    fn banner(title: &str) -> NewBannerAd {
        NewBannerAd {
            title: title.to_string(),
            image_url: format!("https://cdn.test/{title}.png"),
            link_url: None,
        }
    }

    #[test]
    fn deactivated_banners_leave_the_carousel() {
        let conn = open_db_in_memory().unwrap();
        let service = BannerService::new(SqliteStore::try_new(&conn).unwrap());
        let spring = service.create_banner(&banner("spring")).unwrap();
        let summer = service.create_banner(&banner("summer")).unwrap();
        assert_eq!(service.active_banners().unwrap().len(), 2);

        service.set_banner_active(spring.id, false).unwrap();
        let active = service.active_banners().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, summer.id);

        let missing = service.set_banner_active(Uuid::new_v4(), true);
        assert!(matches!(missing, Err(ServiceError::NotFound { entity: "banner", .. })));
    }

    #[test]
    fn banner_requires_title() {
        let conn = open_db_in_memory().unwrap();
        let service = BannerService::new(SqliteStore::try_new(&conn).unwrap());
        let err = service.create_banner(&banner(" ")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
