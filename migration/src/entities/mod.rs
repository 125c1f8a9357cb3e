pub mod acquisition;
pub mod ad_account;
pub mod ad_campaign_stats_daily;
pub mod ad_token;
pub mod campaign;
pub mod deposit;

pub use acquisition::Entity as AcquisitionEntity;
pub use ad_account::Entity as AdAccountEntity;
pub use ad_campaign_stats_daily::Entity as AdCampaignStatsDailyEntity;
pub use ad_token::Entity as AdTokenEntity;
pub use campaign::Entity as CampaignEntity;
pub use deposit::Entity as DepositEntity;
