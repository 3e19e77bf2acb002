//! # 路由控制器

pub mod home;
pub mod risk;
