//! Localized, user-safe texts returned when a provider cannot answer.
//!
//! Codes without a dedicated template get English.

use crate::request::{GradeBand, Language};

/// Returned at the HTTP boundary for truly unexpected failures.
pub const APOLOGY: &str =
    "I'm sorry, I couldn't generate content at this moment. Please try again.";

/// Study guidance used in place of generated content.
///
/// ```
/// use sahayak_gateway::{fallback, GradeBand, Language};
///
/// let text = fallback::fallback_text(&Language::Hindi, "Rain", GradeBand::Two);
/// assert!(text.starts_with("Rain के बारे में (कक्षा 2)"));
/// assert!(text.ends_with("सीखते रहें!"));
/// ```
#[must_use]
pub fn fallback_text(language: &Language, topic: &str, grade: GradeBand) -> String {
    let topic = topic.trim();
    match language {
        Language::Hindi => format!(
            "{topic} के बारे में (कक्षा {grade}):

यह एक बहुत अच्छा सवाल है! अभी AI सहायक उपलब्ध नहीं है, इसलिए हम सुझाव देते हैं:

• पुस्तकों से पढ़ें
• शिक्षकों से पूछें
• इंटरनेट पर भरोसेमंद स्रोत खोजें

सीखते रहें!"
        ),
        Language::Marathi => format!(
            "{topic} बद्दल (इयत्ता {grade}):

हा एक छान प्रश्न आहे! सध्या AI सहाय्यक उपलब्ध नाही, म्हणून आम्ही सुचवतो:

• पुस्तकांमधून वाचा
• शिक्षकांना विचारा
• इंटरनेटवर विश्वासार्ह स्रोत शोधा

शिकत राहा!"
        ),
        Language::Bengali => format!(
            "{topic} সম্পর্কে (শ্রেণী {grade}):

এটি একটি দুর্দান্ত প্রশ্ন! এই মুহূর্তে AI সহায়ক উপলব্ধ নেই, তাই আমরা সুপারিশ করি:

• বই থেকে পড়ুন
• শিক্ষকদের জিজ্ঞাসা করুন
• ইন্টারনেটে নির্ভরযোগ্য উৎস অনুসন্ধান করুন

শেখা চালিয়ে যান!"
        ),
        Language::Telugu => format!(
            "{topic} గురించి (తరగతి {grade}):

ఇది చాలా మంచి ప్రశ్న! ప్రస్తుతం AI సహాయకుడు అందుబాటులో లేదు, కాబట్టి మేము సూచిస్తున్నాము:

• పుస్తకాల నుండి చదవండి
• ఉపాధ్యాయులను అడగండి
• ఇంటర్నెట్‌లో నమ్మదగిన మూలాలను వెతకండి

నేర్చుకోవడం కొనసాగించండి!"
        ),
        Language::Tamil => format!(
            "{topic} பற்றி (வகுப்பு {grade}):

இது ஒரு சிறந்த கேள்வி! இப்போது AI உதவியாளர் கிடைக்கவில்லை, எனவே நாங்கள் பரிந்துரைக்கிறோம்:

• புத்தகங்களில் இருந்து படியுங்கள்
• ஆசிரியர்களிடம் கேளுங்கள்
• இணையத்தில் நம்பகமான ஆதாரங்களைத் தேடுங்கள்

கற்றுக்கொண்டே இருங்கள்!"
        ),
        Language::Gujarati => format!(
            "{topic} વિશે (ધોરણ {grade}):

આ એક ખૂબ સારો પ્રશ્ન છે! હાલમાં AI સહાયક ઉપલબ્ધ નથી, તેથી અમે સૂચવીએ છીએ:

• પુસ્તકોમાંથી વાંચો
• શિક્ષકોને પૂછો
• ઇન્ટરનેટ પર વિશ્વસનીય સ્રોતો શોધો

શીખતા રહો!"
        ),
        Language::Kannada => format!(
            "{topic} ಬಗ್ಗೆ (ತರಗತಿ {grade}):

ಇದು ಒಂದು ಉತ್ತಮ ಪ್ರಶ್ನೆ! ಈಗ AI ಸಹಾಯಕ ಲಭ್ಯವಿಲ್ಲ, ಆದ್ದರಿಂದ ನಾವು ಸೂಚಿಸುತ್ತೇವೆ:

• ಪುಸ್ತಕಗಳಿಂದ ಓದಿ
• ಶಿಕ್ಷಕರನ್ನು ಕೇಳಿ
• ಇಂಟರ್ನೆಟ್‌ನಲ್ಲಿ ವಿಶ್ವಾಸಾರ್ಹ ಮೂಲಗಳನ್ನು ಹುಡುಕಿ

ಕಲಿಯುತ್ತಾ ಇರಿ!"
        ),
        Language::Malayalam => format!(
            "{topic} കുറിച്ച് (ക്ലാസ് {grade}):

ഇത് ഒരു നല്ല ചോദ്യമാണ്! ഇപ്പോൾ AI സഹായി ലഭ്യമല്ല, അതിനാൽ ഞങ്ങൾ നിർദ്ദേശിക്കുന്നു:

• പുസ്തകങ്ങളിൽ നിന്ന് വായിക്കുക
• അധ്യാപകരോട് ചോദിക്കുക
• ഇന്റർനെറ്റിൽ വിശ്വസനീയമായ ഉറവിടങ്ങൾ തിരയുക

പഠിക്കുന്നത് തുടരുക!"
        ),
        Language::Urdu => format!(
            "{topic} کے بارے میں (جماعت {grade}):

یہ ایک بہترین سوال ہے! اس وقت AI معاون دستیاب نہیں ہے، اس لیے ہم تجویز کرتے ہیں:

• کتابوں سے پڑھیں
• اساتذہ سے پوچھیں
• انٹرنیٹ پر قابل اعتماد ذرائع تلاش کریں

سیکھتے رہیں!"
        ),
        Language::English | Language::Other(_) => format!(
            "About \"{topic}\" (Grade {grade}):

That's a great question! The AI assistant is not available right now, so we suggest:

• Read books about this topic
• Ask your teachers
• Search on the internet for reliable sources

Keep learning!"
        ),
    }
}

/// Shown when a model call exceeds its timeout.
#[must_use]
pub const fn timeout_message(language: &Language) -> &'static str {
    match language {
        Language::Hindi => "AI को उत्तर देने में बहुत समय लग रहा है। कृपया फिर से प्रयास करें।",
        Language::Marathi => "AI ला उत्तर देण्यास खूप वेळ लागत आहे. कृपया पुन्हा प्रयत्न करा.",
        Language::Bengali => "AI উত্তর দিতে অনেক সময় নিচ্ছে। অনুগ্রহ করে আবার চেষ্টা করুন।",
        Language::Telugu => {
            "AI సమాధానం ఇవ్వడానికి చాలా సమయం తీసుకుంటోంది. దయచేసి మళ్ళీ ప్రయత్నించండి."
        }
        Language::Tamil => "AI பதிலளிக்க அதிக நேரம் எடுக்கிறது. மீண்டும் முயற்சிக்கவும்.",
        Language::Gujarati => {
            "AI ને જવાબ આપવામાં ઘણો સમય લાગી રહ્યો છે. કૃપા કરીને ફરી પ્રયાસ કરો."
        }
        Language::Kannada => {
            "AI ಉತ್ತರಿಸಲು ತುಂಬಾ ಸಮಯ ತೆಗೆದುಕೊಳ್ಳುತ್ತಿದೆ. ದಯವಿಟ್ಟು ಮತ್ತೆ ಪ್ರಯತ್ನಿಸಿ."
        }
        Language::Malayalam => {
            "AI മറുപടി നൽകാൻ വളരെയധികം സമയമെടുക്കുന്നു. ദയവായി വീണ്ടും ശ്രമിക്കുക."
        }
        Language::Urdu => "AI کو جواب دینے میں بہت وقت لگ رہا ہے۔ براہ کرم دوبارہ کوشش کریں۔",
        Language::English | Language::Other(_) => {
            "The AI is taking too long to respond. Please try again."
        }
    }
}

/// Shown when the local model runs out of memory.
#[must_use]
pub const fn resource_message(language: &Language) -> &'static str {
    match language {
        Language::Hindi => {
            "AI मॉडल के पास अभी पर्याप्त संसाधन नहीं हैं। कृपया थोड़ी देर बाद फिर से प्रयास करें।"
        }
        Language::Marathi => {
            "AI मॉडेलकडे सध्या पुरेशी संसाधने नाहीत. कृपया थोड्या वेळाने पुन्हा प्रयत्न करा."
        }
        Language::Bengali => {
            "AI মডেলের এই মুহূর্তে পর্যাপ্ত সংস্থান নেই। অনুগ্রহ করে কিছুক্ষণ পরে আবার চেষ্টা করুন।"
        }
        Language::Telugu => {
            "AI మోడల్‌కు ప్రస్తుతం తగినన్ని వనరులు లేవు. దయచేసి కొంతసేపటి తర్వాత మళ్ళీ ప్రయత్నించండి."
        }
        Language::Tamil => {
            "AI மாதிரிக்கு தற்போது போதுமான வளங்கள் இல்லை. சிறிது நேரம் கழித்து மீண்டும் முயற்சிக்கவும்."
        }
        Language::Gujarati => {
            "AI મોડેલ પાસે હાલમાં પૂરતા સંસાધનો નથી. કૃપા કરીને થોડી વાર પછી ફરી પ્રયાસ કરો."
        }
        Language::Kannada => {
            "AI ಮಾದರಿಗೆ ಈಗ ಸಾಕಷ್ಟು ಸಂಪನ್ಮೂಲಗಳಿಲ್ಲ. ದಯವಿಟ್ಟು ಸ್ವಲ್ಪ ಸಮಯದ ನಂತರ ಮತ್ತೆ ಪ್ರಯತ್ನಿಸಿ."
        }
        Language::Malayalam => {
            "AI മോഡലിന് ഇപ്പോൾ ആവശ്യമായ വിഭവങ്ങൾ ഇല്ല. കുറച്ച് സമയത്തിന് ശേഷം വീണ്ടും ശ്രമിക്കുക."
        }
        Language::Urdu => {
            "AI ماڈل کے پاس اس وقت کافی وسائل نہیں ہیں۔ براہ کرم کچھ دیر بعد دوبارہ کوشش کریں۔"
        }
        Language::English | Language::Other(_) => {
            "The AI model does not have enough resources right now. Please try again in a little while."
        }
    }
}

/// Shown when the model fails for any other reason.
#[must_use]
pub const fn model_error_message(language: &Language) -> &'static str {
    match language {
        Language::Hindi => "AI मॉडल इस अनुरोध का उत्तर नहीं दे सका। कृपया फिर से प्रयास करें।",
        Language::Marathi => "AI मॉडेल या विनंतीचे उत्तर देऊ शकले नाही. कृपया पुन्हा प्रयत्न करा.",
        Language::Bengali => "AI মডেল এই অনুরোধের উত্তর দিতে পারেনি। অনুগ্রহ করে আবার চেষ্টা করুন।",
        Language::Telugu => {
            "AI మోడల్ ఈ అభ్యర్థనకు సమాధానం ఇవ్వలేకపోయింది. దయచేసి మళ్ళీ ప్రయత్నించండి."
        }
        Language::Tamil => {
            "AI மாதிரியால் இந்த கோரிக்கைக்கு பதிலளிக்க முடியவில்லை. மீண்டும் முயற்சிக்கவும்."
        }
        Language::Gujarati => {
            "AI મોડેલ આ વિનંતીનો જવાબ આપી શક્યું નહીં. કૃપા કરીને ફરી પ્રયાસ કરો."
        }
        Language::Kannada => {
            "AI ಮಾದರಿಗೆ ಈ ವಿನಂತಿಗೆ ಉತ್ತರಿಸಲು ಸಾಧ್ಯವಾಗಲಿಲ್ಲ. ದಯವಿಟ್ಟು ಮತ್ತೆ ಪ್ರಯತ್ನಿಸಿ."
        }
        Language::Malayalam => {
            "AI മോഡലിന് ഈ അഭ്യർത്ഥനയ്ക്ക് മറുപടി നൽകാൻ കഴിഞ്ഞില്ല. ദയവായി വീണ്ടും ശ്രമിക്കുക."
        }
        Language::Urdu => "AI ماڈل اس درخواست کا جواب نہیں دے سکا۔ براہ کرم دوبارہ کوشش کریں۔",
        Language::English | Language::Other(_) => {
            "The AI model could not answer this request. Please try again."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [&str; 11] = ["en", "hi", "mr", "bn", "te", "ta", "gu", "kn", "ml", "ur", "fr"];

    #[test]
    fn every_language_has_non_empty_messages() {
        for code in ALL {
            let language = Language::from_code(code);
            let text = fallback_text(&language, "Volcano", GradeBand::Four);
            assert!(text.contains("Volcano"), "{code}");
            assert!(text.contains('4'), "{code}");
            assert_eq!(text.matches('•').count(), 3, "{code}");
            assert!(!timeout_message(&language).is_empty());
            assert!(!resource_message(&language).is_empty());
            assert!(!model_error_message(&language).is_empty());
        }
    }

    #[test]
    fn unsupported_language_gets_english() {
        let french = Language::from_code("fr");
        assert_eq!(
            fallback_text(&french, "Rain", GradeBand::One),
            fallback_text(&Language::English, "Rain", GradeBand::One)
        );
        assert_eq!(timeout_message(&french), timeout_message(&Language::English));
    }

    #[test]
    fn english_fallback_shape() {
        let text = fallback_text(&Language::English, "  Magnets ", GradeBand::Three);
        assert!(text.starts_with("About \"Magnets\" (Grade 3):"));
        assert!(text.ends_with("Keep learning!"));
    }

    #[test]
    fn messages_are_distinct() {
        let hindi = Language::Hindi;
        assert_ne!(timeout_message(&hindi), resource_message(&hindi));
        assert_ne!(resource_message(&hindi), model_error_message(&hindi));
    }
}
