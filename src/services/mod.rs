// 后端服务模块

pub mod storage;
