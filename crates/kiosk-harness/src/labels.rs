#![forbid(unsafe_code)]

//! Screen text in the three kiosk languages.

use kiosk::core::locale::Lang;
use kiosk::form::FieldId;

pub struct Labels {
    pub title: &'static str,
    pub depositor: &'static str,
    pub visitor_id: &'static str,
    pub prisoner: &'static str,
    pub zone: &'static str,
    pub submit: &'static str,
    pub clear: &'static str,
    pub fill_hint: &'static str,
    pub warning_title: &'static str,
    pub resetting_in: &'static str,
    pub continue_session: &'static str,
    pub exit: &'static str,
    pub code_title: &'static str,
    pub closes_in: &'static str,
    pub done: &'static str,
    pub export: &'static str,
    pub seconds: &'static str,
    pub build_failed: &'static str,
    pub render_failed: &'static str,
    pub exported: &'static str,
}

impl Labels {
    pub fn field(&self, id: FieldId) -> &'static str {
        match id {
            FieldId::Depositor => self.depositor,
            FieldId::VisitorId => self.visitor_id,
            FieldId::Prisoner => self.prisoner,
            FieldId::Zone => self.zone,
        }
    }
}

static TH: Labels = Labels {
    title: "ลงทะเบียนเยี่ยมญาติ",
    depositor: "ชื่อผู้ฝาก",
    visitor_id: "เลขบัตรผู้เยี่ยม",
    prisoner: "ชื่อผู้ต้องขัง",
    zone: "แดน",
    submit: "สร้างคิวอาร์",
    clear: "ล้างข้อมูล",
    fill_hint: "กรุณากรอกข้อมูลที่จำเป็นให้ครบ",
    warning_title: "ไม่มีการใช้งาน",
    resetting_in: "ระบบจะล้างข้อมูลใน",
    continue_session: "ใช้งานต่อ",
    exit: "ออก",
    code_title: "สแกนคิวอาร์ด้วยโทรศัพท์",
    closes_in: "ปิดใน",
    done: "เสร็จสิ้น",
    export: "บันทึกภาพ",
    seconds: "วินาที",
    build_failed: "สร้างลิงก์ไม่สำเร็จ",
    render_failed: "แสดงคิวอาร์ไม่สำเร็จ",
    exported: "บันทึกแล้ว",
};

static EN: Labels = Labels {
    title: "Visit registration",
    depositor: "Depositor name",
    visitor_id: "Visitor ID",
    prisoner: "Prisoner name",
    zone: "Zone",
    submit: "Create QR",
    clear: "Clear",
    fill_hint: "Please fill in all required fields",
    warning_title: "Are you still there?",
    resetting_in: "The form resets in",
    continue_session: "Continue",
    exit: "Exit",
    code_title: "Scan the QR code with your phone",
    closes_in: "Closes in",
    done: "Done",
    export: "Save image",
    seconds: "s",
    build_failed: "Could not build the link",
    render_failed: "Could not show the code",
    exported: "Saved",
};

static ZH: Labels = Labels {
    title: "探视登记",
    depositor: "存款人姓名",
    visitor_id: "探视人证件号",
    prisoner: "在押人员姓名",
    zone: "监区",
    submit: "生成二维码",
    clear: "清除",
    fill_hint: "请填写所有必填项",
    warning_title: "您还在吗？",
    resetting_in: "表单将在以下时间后重置",
    continue_session: "继续",
    exit: "退出",
    code_title: "请用手机扫描二维码",
    closes_in: "关闭倒计时",
    done: "完成",
    export: "保存图片",
    seconds: "秒",
    build_failed: "无法生成链接",
    render_failed: "无法显示二维码",
    exported: "已保存",
};

pub fn labels(lang: Lang) -> &'static Labels {
    match lang {
        Lang::Th => &TH,
        Lang::En => &EN,
        Lang::Zh => &ZH,
    }
}

/// Short name on the language buttons.
pub fn lang_button(lang: Lang) -> &'static str {
    match lang {
        Lang::Th => "ไทย",
        Lang::En => "EN",
        Lang::Zh => "中文",
    }
}
