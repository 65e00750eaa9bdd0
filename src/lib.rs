// invhub - 资产清单服务
// 主机发现（SSH 采集 /etc/os-release）、方案图编辑与静态前端

pub mod api;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod logging;
pub mod models;
pub mod services;
pub mod ssh;
pub mod state;
