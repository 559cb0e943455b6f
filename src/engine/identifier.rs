// ==========================================
// 渗透测试报告生成系统 - 标识符生成器
// ==========================================
// 职责: 生成段落 ID (w14:paraId) 与目录书签名 (_Toc########)
// 随机源: uuid v4（底层 getrandom，密码学安全）
// 说明: 不维护全局唯一性登记，碰撞概率视为可忽略
// ==========================================

use uuid::Uuid;

/// 书签名前缀
pub const CROSS_REF_PREFIX: &str = "_Toc";

/// paraId 上限（Word 要求 w14:paraId < 0x80000000）
const PARA_ID_MASK: u32 = 0x7FFF_FFFF;

fn random_u32() -> u32 {
    let bytes = Uuid::new_v4().into_bytes();
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// 生成段落 ID（8 位十六进制，大写）
pub fn new_paragraph_id() -> String {
    format!("{:08X}", random_u32() & PARA_ID_MASK)
}

/// 生成交叉引用书签名（"_Toc" + 8 位数字）
pub fn new_cross_ref_name() -> String {
    format!("{}{:08}", CROSS_REF_PREFIX, random_u32() % 100_000_000)
}

/// 生成输出文件名消歧后缀（4 位十六进制，小写）
pub fn new_disambiguator() -> String {
    format!("{:04x}", random_u32() & 0xFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paragraph_id_format() {
        for _ in 0..200 {
            let id = new_paragraph_id();
            assert_eq!(id.len(), 8);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(u32::from_str_radix(&id, 16).unwrap() < 0x8000_0000);
        }
    }

    #[test]
    fn test_cross_ref_name_format() {
        let name = new_cross_ref_name();
        assert!(name.starts_with("_Toc"));
        let digits = &name[4..];
        assert_eq!(digits.len(), 8);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_disambiguator_format() {
        let d = new_disambiguator();
        assert_eq!(d.len(), 4);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ids_rarely_collide() {
        let ids: HashSet<String> = (0..1000).map(|_| new_paragraph_id()).collect();
        assert!(ids.len() > 990);
    }
}
