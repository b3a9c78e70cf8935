//! 터미널 표 및 PNG 차트 출력.

pub mod chart;
pub mod table;
